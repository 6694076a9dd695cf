use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use domain::{RiskRequest, RiskResponse};
use tracing::info;

use crate::{error::ApiError, routes::AddressQuery, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/analyze", get(analyze))
}

async fn analyze(
    State(state): State<AppState>,
    Query(params): Query<AddressQuery>,
) -> Result<Json<RiskResponse>, ApiError> {
    let address = params.wallet()?;
    let portfolio = state.portfolio.fetch_portfolio(&address).await?;
    info!(
        %address,
        total_balance_usd = portfolio.total_balance_usd(),
        "portfolio forwarded for risk analysis"
    );

    let request = RiskRequest { address, portfolio };
    let verdict = state.advisor.analyze(&request).await?;
    Ok(Json(verdict))
}
