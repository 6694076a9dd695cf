use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ADDRESS_LEN: usize = 42;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AddressError {
    #[error("address parameter is required")]
    Missing,
    #[error("invalid Ethereum address format")]
    InvalidFormat,
}

/// A syntactically checked `0x` wallet address. The value is never decoded
/// or checksum-verified; it is forwarded upstream exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        if input.is_empty() {
            return Err(AddressError::Missing);
        }
        if input.len() != ADDRESS_LEN || !input.starts_with("0x") {
            return Err(AddressError::InvalidFormat);
        }
        Ok(Self(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for WalletAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Network {
    pub name: String,
    pub slug: String,
}

impl Network {
    pub fn base() -> Self {
        Self {
            name: "Base".to_string(),
            slug: "base".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TokenBalance {
    pub token_address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: f64,
    pub price: f64,
    pub balance: f64,
    pub balance_usd: f64,
    /// Raw on-chain integer amount, kept as text to avoid precision loss.
    pub balance_raw: String,
    pub network: Network,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_url_v2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_change_24h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct TokenBalances {
    pub total_balance_usd: f64,
    #[serde(default)]
    pub by_token: Vec<TokenBalance>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct App {
    pub display_name: String,
    pub slug: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TokenPosition {
    pub meta_type: String,
    pub token: TokenBalance,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct DisplayProps {
    pub label: String,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ContractPosition {
    /// Upstream group label; `"unknown"` when the provider sends none.
    pub address: String,
    pub position_type: String,
    pub balance_usd: f64,
    #[serde(default)]
    pub tokens: Vec<TokenPosition>,
    pub display_props: DisplayProps,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppBalance {
    pub app: App,
    pub network: Network,
    #[serde(default)]
    pub balances: Vec<ContractPosition>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct AppBalances {
    pub total_balance_usd: f64,
    #[serde(default)]
    pub by_app: Vec<AppBalance>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct PortfolioSnapshot {
    pub token_balances: TokenBalances,
    pub app_balances: AppBalances,
}

impl PortfolioSnapshot {
    pub fn total_balance_usd(&self) -> f64 {
        self.token_balances.total_balance_usd + self.app_balances.total_balance_usd
    }

    pub fn contract_positions(&self) -> impl Iterator<Item = &ContractPosition> {
        self.app_balances
            .by_app
            .iter()
            .flat_map(|app| app.balances.iter())
    }
}

/// Payload forwarded to the risk advisor.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RiskRequest {
    pub address: WalletAddress,
    #[serde(flatten)]
    pub portfolio: PortfolioSnapshot,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct RiskResponse {
    #[serde(default)]
    pub recommended_tokens: Vec<String>,
    #[serde(default)]
    pub risk_score: f64,
    #[serde(default)]
    pub reasoning: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PoolToken {
    pub id: String,
    pub symbol: String,
    pub decimals: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub id: String,
    pub token0: PoolToken,
    pub token1: PoolToken,
    pub fee_tier: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityPosition {
    pub id: String,
    pub owner: String,
    pub liquidity: String,
    pub deposited_token0: String,
    pub deposited_token1: String,
    pub withdrawn_token0: String,
    pub withdrawn_token1: String,
    pub collected_fees_token0: String,
    pub collected_fees_token1: String,
    pub pool: Pool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PositionsResponse {
    pub address: String,
    #[serde(default)]
    pub positions: Vec<LiquidityPosition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_prefixed_42_char_address() {
        let address = WalletAddress::parse("0x1234567890123456789012345678901234567890")
            .expect("valid address");
        assert_eq!(address.as_str(), "0x1234567890123456789012345678901234567890");
    }

    #[test]
    fn rejects_empty_address_as_missing() {
        assert_eq!(WalletAddress::parse(""), Err(AddressError::Missing));
    }

    #[test]
    fn rejects_wrong_length_or_prefix() {
        for input in [
            "0x123",
            "0x12345678901234567890123456789012345678901",
            "1x1234567890123456789012345678901234567890",
            "001234567890123456789012345678901234567890",
            "0X1234567890123456789012345678901234567890",
        ] {
            assert_eq!(
                WalletAddress::parse(input),
                Err(AddressError::InvalidFormat),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn checksum_casing_is_not_verified() {
        assert!(WalletAddress::parse(&format!("0x{}", "Z".repeat(40))).is_ok());
    }

    #[test]
    fn risk_request_flattens_snapshot_next_to_address() {
        let request = RiskRequest {
            address: WalletAddress::parse("0x1234567890123456789012345678901234567890").unwrap(),
            portfolio: PortfolioSnapshot::default(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["address"], "0x1234567890123456789012345678901234567890");
        assert_eq!(value["token_balances"]["by_token"], serde_json::json!([]));
        assert_eq!(value["app_balances"]["by_app"], serde_json::json!([]));
    }

    #[test]
    fn positions_response_never_serializes_null_list() {
        let response = PositionsResponse {
            address: "0x1234567890123456789012345678901234567890".to_string(),
            positions: Vec::new(),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["positions"], serde_json::json!([]));
    }
}
