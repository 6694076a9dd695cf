use async_trait::async_trait;
use domain::{RiskRequest, RiskResponse};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("failed to marshal risk request: {0}")]
    Encode(String),
    #[error("failed to make HTTP request: {0}")]
    Transport(String),
    #[error("risk advisor API returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to unmarshal risk response: {0}")]
    Decode(String),
}

pub type AdvisorResult<T> = Result<T, AdvisorError>;

#[async_trait]
pub trait RiskAdvisor: Send + Sync {
    async fn analyze(&self, request: &RiskRequest) -> AdvisorResult<RiskResponse>;
}

/// Answers every request with the same verdict.
#[derive(Clone, Default)]
pub struct StaticRiskAdvisor {
    response: RiskResponse,
}

impl StaticRiskAdvisor {
    pub fn new(response: RiskResponse) -> Self {
        Self { response }
    }
}

#[async_trait]
impl RiskAdvisor for StaticRiskAdvisor {
    async fn analyze(&self, _request: &RiskRequest) -> AdvisorResult<RiskResponse> {
        Ok(self.response.clone())
    }
}
