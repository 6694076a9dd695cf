use advisor::{AdvisorError, AdvisorResult, RiskAdvisor};
use async_trait::async_trait;
use domain::{RiskRequest, RiskResponse};
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use tracing::{debug, warn};

/// Forwards the normalized portfolio to the risk advisor service and hands
/// back its verdict untouched.
#[derive(Clone)]
pub struct HttpRiskAdvisor {
    client: Client,
    endpoint: String,
}

impl HttpRiskAdvisor {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl RiskAdvisor for HttpRiskAdvisor {
    async fn analyze(&self, request: &RiskRequest) -> AdvisorResult<RiskResponse> {
        let body = serde_json::to_vec(request).map_err(|err| {
            record_outcome("encode_error");
            AdvisorError::Encode(err.to_string())
        })?;

        let resp = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|err| {
                record_outcome("transport_error");
                AdvisorError::Transport(err.to_string())
            })?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            record_outcome("status_error");
            warn!(%status, endpoint = %self.endpoint, "risk advisor rejected request");
            return Err(AdvisorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await.map_err(|err| {
            record_outcome("transport_error");
            AdvisorError::Transport(format!("failed to read response body: {err}"))
        })?;
        let verdict: RiskResponse = serde_json::from_slice(&bytes).map_err(|err| {
            record_outcome("decode_error");
            AdvisorError::Decode(err.to_string())
        })?;
        record_outcome("ok");
        debug!(
            address = %request.address,
            risk_score = verdict.risk_score,
            "risk analysis received"
        );
        Ok(verdict)
    }
}

fn record_outcome(outcome: &'static str) {
    metrics::counter!(
        "upstream_requests_total",
        "upstream" => "risk_advisor",
        "query" => "analyze",
        "outcome" => outcome
    )
    .increment(1);
}
