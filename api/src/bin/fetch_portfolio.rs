use anyhow::Context;
use api::{bootstrap::build_state, config::AppConfig, telemetry};
use clap::Parser;
use domain::{RiskRequest, WalletAddress};

#[derive(Parser)]
#[command(name = "fetch_portfolio")]
#[command(about = "Fetch and print the normalized portfolio sent to the risk advisor")]
struct Args {
    /// Wallet address (42 chars, 0x-prefixed)
    address: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing()?;
    let args = Args::parse();

    let address = WalletAddress::parse(args.address.trim())?;
    let config = AppConfig::from_env()?;
    let state = build_state(&config)?;

    let portfolio = state
        .portfolio
        .fetch_portfolio(&address)
        .await
        .context("failed to fetch portfolio data")?;
    tracing::info!(
        %address,
        tokens = portfolio.token_balances.by_token.len(),
        apps = portfolio.app_balances.by_app.len(),
        total_balance_usd = portfolio.total_balance_usd(),
        "portfolio fetched"
    );

    let request = RiskRequest { address, portfolio };
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}
