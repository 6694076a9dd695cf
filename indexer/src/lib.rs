use async_trait::async_trait;
use domain::{PortfolioSnapshot, WalletAddress};
use thiserror::Error;

/// Failure outcomes of a portfolio lookup. Every variant names the query
/// that failed so the message can be relayed to the caller as-is.
#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("ZAPPER_API_KEY environment variable is not set")]
    MissingApiKey,
    #[error("{query} request failed: {message}")]
    Transport { query: &'static str, message: String },
    #[error("{query} API returned status {status}: {body}")]
    Status {
        query: &'static str,
        status: u16,
        body: String,
    },
    #[error("{query} API errors: {}", .messages.join("; "))]
    GraphQl {
        query: &'static str,
        messages: Vec<String>,
    },
    #[error("failed to decode {query} response: {message}")]
    Decode { query: &'static str, message: String },
}

pub type PortfolioResult<T> = Result<T, PortfolioError>;

#[async_trait]
pub trait PortfolioSource: Send + Sync {
    async fn fetch_portfolio(&self, address: &WalletAddress) -> PortfolioResult<PortfolioSnapshot>;
}

/// Serves one fixed snapshot for every address. Useful for local runs
/// without a provider key and for handler tests.
#[derive(Clone, Default)]
pub struct InMemoryPortfolioSource {
    snapshot: PortfolioSnapshot,
}

impl InMemoryPortfolioSource {
    pub fn new(snapshot: PortfolioSnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl PortfolioSource for InMemoryPortfolioSource {
    async fn fetch_portfolio(&self, _address: &WalletAddress) -> PortfolioResult<PortfolioSnapshot> {
        Ok(self.snapshot.clone())
    }
}
