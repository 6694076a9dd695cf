use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use domain::PositionsResponse;
use tracing::info;

use crate::{error::ApiError, routes::AddressQuery, services::positions_from_snapshot, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/positions", get(list_positions))
}

async fn list_positions(
    State(state): State<AppState>,
    Query(params): Query<AddressQuery>,
) -> Result<Json<PositionsResponse>, ApiError> {
    let address = params.wallet()?;
    let snapshot = state.portfolio.fetch_portfolio(&address).await?;
    let positions = positions_from_snapshot(&address, &snapshot);
    info!(%address, positions = positions.len(), "positions listed");

    Ok(Json(PositionsResponse {
        address: address.to_string(),
        positions,
    }))
}
