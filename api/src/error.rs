use advisor::AdvisorError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain::AddressError;
use indexer::PortfolioError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    InvalidAddress(#[from] AddressError),
    #[error("failed to fetch portfolio data: {0}")]
    Portfolio(#[from] PortfolioError),
    #[error("failed to get risk analysis: {0}")]
    Analysis(#[from] AdvisorError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidAddress(_) => StatusCode::BAD_REQUEST,
            ApiError::Portfolio(_) | ApiError::Analysis(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            metrics::counter!("address_rejections_total").increment(1);
            tracing::debug!(error = %self, "request rejected");
        }
        (status, self.to_string()).into_response()
    }
}
