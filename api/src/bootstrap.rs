use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Client;

use crate::{
    config::AppConfig,
    services::{HttpRiskAdvisor, ZapperClient},
    state::AppState,
};

pub fn build_state(config: &AppConfig) -> Result<AppState> {
    // 兩個上游共用同一個連線池；不覆寫 client 預設 timeout
    let client = Client::builder()
        .user_agent(concat!("wallet-relay/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;

    if config.zapper_api_key.is_none() {
        tracing::warn!("ZAPPER_API_KEY is not set; portfolio requests will fail");
    }

    let portfolio = Arc::new(ZapperClient::new(
        client.clone(),
        config.zapper_api_url.clone(),
        config.zapper_api_key.clone(),
    ));
    let advisor = Arc::new(HttpRiskAdvisor::new(
        client,
        config.risk_advisor_url.clone(),
    ));

    Ok(AppState {
        config: config.clone(),
        portfolio,
        advisor,
    })
}
