//! Intermediate records for the portfolio provider's GraphQL payloads and
//! their mapping into the `domain` schema.
//!
//! The provider is inconsistent about numeric encodings: the same logical
//! field arrives as a JSON number in one query and as a string in another,
//! and many fields are nullable. Every numeric field is therefore read as a
//! [`LenientNumber`] and collapsed with [`lenient_f64`], which turns anything
//! unreadable into `0.0` instead of failing the request.

use domain::{
    App, AppBalance, AppBalances, ContractPosition, DisplayProps, LiquidityPosition, Network,
    Pool, PoolToken, PortfolioSnapshot, TokenBalance, TokenBalances, TokenPosition, WalletAddress,
};
use serde::{Deserialize, Deserializer};

pub const UNKNOWN_ADDRESS: &str = "unknown";
pub const DEFAULT_DECIMALS: f64 = 18.0;
pub const DEFAULT_NETWORK_SLUG: &str = "base";
pub const DEFAULT_FEE_TIER: &str = "3000";
pub const DEFAULT_LIQUIDITY: &str = "1.0";
const ZERO_AMOUNT: &str = "0";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LenientNumber {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl LenientNumber {
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            Self::Other(_) => None,
        }
    }

    /// The value as the provider wrote it, for fields kept as text.
    pub fn raw_text(&self) -> String {
        match self {
            Self::Number(value) => value.to_string(),
            Self::Text(text) => text.clone(),
            Self::Other(value) => value.to_string(),
        }
    }
}

pub fn lenient_f64(value: Option<&LenientNumber>) -> f64 {
    value.and_then(LenientNumber::to_f64).unwrap_or(0.0)
}

fn lenient_opt(value: Option<&LenientNumber>) -> Option<f64> {
    value.and_then(LenientNumber::to_f64)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Connection<T> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub edges: Vec<Edge<T>>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self { edges: Vec::new() }
    }
}

impl<T> Connection<T> {
    fn into_nodes(self) -> impl Iterator<Item = T> {
        self.edges.into_iter().map(|edge| edge.node)
    }
}

#[derive(Debug, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

// ---- token balances query ----

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalancesData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub portfolio_v2: TokenPortfolio,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPortfolio {
    #[serde(default, deserialize_with = "null_as_default")]
    pub token_balances: TokenBalancesNode,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalancesNode {
    #[serde(rename = "totalBalanceUSD", default)]
    pub total_balance_usd: Option<LenientNumber>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub by_token: Connection<TokenNode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenNode {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub price: Option<LenientNumber>,
    #[serde(default)]
    pub token_address: Option<String>,
    #[serde(rename = "imgUrlV2", default)]
    pub img_url_v2: Option<String>,
    #[serde(default)]
    pub decimals: Option<LenientNumber>,
    #[serde(default)]
    pub balance_raw: Option<LenientNumber>,
    #[serde(default)]
    pub balance: Option<LenientNumber>,
    #[serde(rename = "balanceUSD", default)]
    pub balance_usd: Option<LenientNumber>,
    #[serde(default)]
    pub onchain_market_data: Option<MarketData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    #[serde(default)]
    pub price_change24h: Option<LenientNumber>,
    #[serde(default)]
    pub market_cap: Option<LenientNumber>,
}

// ---- app balances query ----

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppBalancesData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub portfolio_v2: AppPortfolio,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppPortfolio {
    #[serde(default, deserialize_with = "null_as_default")]
    pub app_balances: AppBalancesNode,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppBalancesNode {
    #[serde(rename = "totalBalanceUSD", default)]
    pub total_balance_usd: Option<LenientNumber>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub by_app: Connection<AppNode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppNode {
    #[serde(rename = "balanceUSD", default)]
    pub balance_usd: Option<LenientNumber>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub app: AppMeta,
    #[serde(default, deserialize_with = "null_as_default")]
    pub network: NetworkNode,
    #[serde(default, deserialize_with = "null_as_default")]
    pub position_balances: Connection<PositionNode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppMeta {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub img_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkNode {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub chain_id: Option<LenientNumber>,
}

/// Either an `AppTokenPositionBalance` (own symbol/balance/price) or a
/// `ContractPositionBalance` (a list of token legs); the provider returns
/// both shapes in the same connection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionNode {
    #[serde(rename = "type", default)]
    pub position_type: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub balance: Option<LenientNumber>,
    #[serde(rename = "balanceUSD", default)]
    pub balance_usd: Option<LenientNumber>,
    #[serde(default)]
    pub price: Option<LenientNumber>,
    #[serde(default)]
    pub group_label: Option<String>,
    #[serde(default)]
    pub tokens: Option<Vec<PositionLeg>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_props: DisplayPropsNode,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionLeg {
    #[serde(default)]
    pub meta_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub token: LegToken,
}

#[derive(Debug, Default, Deserialize)]
pub struct LegToken {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub balance: Option<LenientNumber>,
    #[serde(rename = "balanceUSD", default)]
    pub balance_usd: Option<LenientNumber>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DisplayPropsNode {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<String>,
}

// ---- mapping ----

pub fn token_balances(node: TokenBalancesNode) -> TokenBalances {
    let by_token = node
        .by_token
        .into_nodes()
        .map(|token| {
            let market = token.onchain_market_data.unwrap_or_default();
            TokenBalance {
                token_address: token.token_address.unwrap_or_default(),
                symbol: token.symbol.unwrap_or_default(),
                name: token.name.unwrap_or_default(),
                decimals: lenient_f64(token.decimals.as_ref()),
                price: lenient_f64(token.price.as_ref()),
                balance: lenient_f64(token.balance.as_ref()),
                balance_usd: lenient_f64(token.balance_usd.as_ref()),
                balance_raw: token
                    .balance_raw
                    .as_ref()
                    .map(LenientNumber::raw_text)
                    .unwrap_or_default(),
                // the token query is pinned to Base
                network: Network::base(),
                img_url_v2: token.img_url_v2,
                price_change_24h: lenient_opt(market.price_change24h.as_ref()),
                market_cap: lenient_opt(market.market_cap.as_ref()),
            }
        })
        .collect();

    TokenBalances {
        total_balance_usd: lenient_f64(node.total_balance_usd.as_ref()),
        by_token,
    }
}

pub fn app_balances(node: AppBalancesNode) -> AppBalances {
    let by_app = node.by_app.into_nodes().map(app_balance).collect();
    AppBalances {
        total_balance_usd: lenient_f64(node.total_balance_usd.as_ref()),
        by_app,
    }
}

fn app_balance(node: AppNode) -> AppBalance {
    let network = Network {
        name: node.network.name.unwrap_or_default(),
        slug: DEFAULT_NETWORK_SLUG.to_string(),
    };
    let balances = node
        .position_balances
        .into_nodes()
        .map(|position| contract_position(position, &network))
        .collect();

    AppBalance {
        app: App {
            display_name: node.app.display_name.unwrap_or_default(),
            slug: node
                .app
                .category
                .and_then(|category| category.name)
                .unwrap_or_default(),
        },
        network,
        balances,
    }
}

fn contract_position(node: PositionNode, network: &Network) -> ContractPosition {
    let position_type = node.position_type.unwrap_or_default();
    let tokens = match node.tokens {
        Some(legs) => legs
            .into_iter()
            .map(|leg| contract_leg(leg, network))
            .collect(),
        None => node
            .symbol
            .map(|symbol| {
                vec![TokenPosition {
                    meta_type: position_type.clone(),
                    token: leg_balance(
                        symbol,
                        node.balance.as_ref(),
                        node.balance_usd.as_ref(),
                        lenient_f64(node.price.as_ref()),
                        network,
                    ),
                }]
            })
            .unwrap_or_default(),
    };

    ContractPosition {
        address: node
            .group_label
            .unwrap_or_else(|| UNKNOWN_ADDRESS.to_string()),
        position_type,
        balance_usd: lenient_f64(node.balance_usd.as_ref()),
        tokens,
        display_props: DisplayProps {
            label: node.display_props.label.unwrap_or_default(),
            images: node.display_props.images,
        },
    }
}

fn contract_leg(leg: PositionLeg, network: &Network) -> TokenPosition {
    TokenPosition {
        meta_type: leg.meta_type.unwrap_or_default(),
        token: leg_balance(
            leg.token.symbol.unwrap_or_default(),
            leg.token.balance.as_ref(),
            leg.token.balance_usd.as_ref(),
            0.0,
            network,
        ),
    }
}

/// Legs only carry symbol and amounts; the remaining fields get fixed
/// placeholders.
fn leg_balance(
    symbol: String,
    balance: Option<&LenientNumber>,
    balance_usd: Option<&LenientNumber>,
    price: f64,
    network: &Network,
) -> TokenBalance {
    TokenBalance {
        token_address: UNKNOWN_ADDRESS.to_string(),
        name: symbol.clone(),
        symbol,
        decimals: DEFAULT_DECIMALS,
        price,
        balance: lenient_f64(balance),
        balance_usd: lenient_f64(balance_usd),
        balance_raw: balance.map(LenientNumber::raw_text).unwrap_or_default(),
        network: network.clone(),
        img_url_v2: None,
        price_change_24h: None,
        market_cap: None,
    }
}

/// Flattens every contract position with at least two legs into the
/// pool-style listing shape. Positions with fewer legs are skipped.
pub fn positions_from_snapshot(
    owner: &WalletAddress,
    snapshot: &PortfolioSnapshot,
) -> Vec<LiquidityPosition> {
    snapshot
        .contract_positions()
        .filter_map(|position| match position.tokens.as_slice() {
            [first, second, ..] => Some(LiquidityPosition {
                id: position.address.clone(),
                owner: owner.to_string(),
                liquidity: DEFAULT_LIQUIDITY.to_string(),
                deposited_token0: ZERO_AMOUNT.to_string(),
                deposited_token1: ZERO_AMOUNT.to_string(),
                withdrawn_token0: ZERO_AMOUNT.to_string(),
                withdrawn_token1: ZERO_AMOUNT.to_string(),
                collected_fees_token0: ZERO_AMOUNT.to_string(),
                collected_fees_token1: ZERO_AMOUNT.to_string(),
                pool: Pool {
                    id: position.address.clone(),
                    token0: pool_token(&first.token),
                    token1: pool_token(&second.token),
                    fee_tier: DEFAULT_FEE_TIER.to_string(),
                },
            }),
            _ => None,
        })
        .collect()
}

fn pool_token(token: &TokenBalance) -> PoolToken {
    PoolToken {
        id: token.token_address.clone(),
        symbol: token.symbol.clone(),
        decimals: format!("{:.0}", token.decimals),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn owner() -> WalletAddress {
        WalletAddress::parse("0x1234567890123456789012345678901234567890").unwrap()
    }

    #[test]
    fn lenient_number_reads_numbers_and_numeric_strings() {
        let number: LenientNumber = serde_json::from_value(json!(1.5)).unwrap();
        let text: LenientNumber = serde_json::from_value(json!(" 2.25 ")).unwrap();
        let integer: LenientNumber = serde_json::from_value(json!(18)).unwrap();
        assert_eq!(lenient_f64(Some(&number)), 1.5);
        assert_eq!(lenient_f64(Some(&text)), 2.25);
        assert_eq!(lenient_f64(Some(&integer)), 18.0);
    }

    #[test]
    fn lenient_number_defaults_unreadable_values_to_zero() {
        let garbage: LenientNumber = serde_json::from_value(json!("n/a")).unwrap();
        let object: LenientNumber = serde_json::from_value(json!({"amount": 3})).unwrap();
        let nan: LenientNumber = serde_json::from_value(json!("NaN")).unwrap();
        assert_eq!(lenient_f64(Some(&garbage)), 0.0);
        assert_eq!(lenient_f64(Some(&object)), 0.0);
        assert_eq!(lenient_f64(Some(&nan)), 0.0);
        assert_eq!(lenient_f64(None), 0.0);
    }

    #[test]
    fn token_nodes_tolerate_null_price_and_market_data() {
        let node: TokenBalancesNode = serde_json::from_value(json!({
            "totalBalanceUSD": 120.5,
            "byToken": {
                "totalCount": 1,
                "edges": [{
                    "node": {
                        "name": "USD Coin",
                        "symbol": "USDC",
                        "price": null,
                        "tokenAddress": "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913",
                        "imgUrlV2": null,
                        "decimals": 6,
                        "balanceRaw": "120500000",
                        "balance": 120.5,
                        "balanceUSD": 120.5,
                        "onchainMarketData": { "priceChange24h": null, "marketCap": "1000000" }
                    }
                }]
            }
        }))
        .unwrap();

        let balances = token_balances(node);
        assert_eq!(balances.total_balance_usd, 120.5);
        assert_eq!(balances.by_token.len(), 1);
        let token = &balances.by_token[0];
        assert_eq!(token.symbol, "USDC");
        assert_eq!(token.price, 0.0);
        assert_eq!(token.decimals, 6.0);
        assert_eq!(token.balance_raw, "120500000");
        assert_eq!(token.network, Network::base());
        assert_eq!(token.price_change_24h, None);
        assert_eq!(token.market_cap, Some(1_000_000.0));
    }

    #[test]
    fn app_positions_default_missing_labels_and_string_balances() {
        let node: AppBalancesNode = serde_json::from_value(json!({
            "totalBalanceUSD": 300,
            "byApp": {
                "edges": [{
                    "node": {
                        "balanceUSD": 300,
                        "app": {
                            "displayName": "Aerodrome",
                            "imgUrl": "https://example.invalid/aero.png",
                            "description": "DEX",
                            "category": { "name": "dex" }
                        },
                        "network": { "name": "Base", "chainId": 8453 },
                        "positionBalances": {
                            "edges": [{
                                "node": {
                                    "type": "contract-position",
                                    "balanceUSD": 300,
                                    "groupLabel": null,
                                    "tokens": [
                                        { "metaType": "SUPPLIED", "token": { "symbol": "WETH", "balance": "0.05", "balanceUSD": "150" } },
                                        { "metaType": "SUPPLIED", "token": { "symbol": "USDC", "balance": "not-a-number", "balanceUSD": "150" } }
                                    ],
                                    "displayProps": { "label": "WETH/USDC", "images": null }
                                }
                            }]
                        }
                    }
                }]
            }
        }))
        .unwrap();

        let balances = app_balances(node);
        assert_eq!(balances.total_balance_usd, 300.0);
        let app = &balances.by_app[0];
        assert_eq!(app.app.display_name, "Aerodrome");
        assert_eq!(app.app.slug, "dex");
        assert_eq!(app.network.slug, DEFAULT_NETWORK_SLUG);

        let position = &app.balances[0];
        assert_eq!(position.address, UNKNOWN_ADDRESS);
        assert_eq!(position.display_props.label, "WETH/USDC");
        assert!(position.display_props.images.is_empty());

        let weth = &position.tokens[0].token;
        assert_eq!(weth.balance, 0.05);
        assert_eq!(weth.balance_usd, 150.0);
        assert_eq!(weth.balance_raw, "0.05");
        assert_eq!(weth.token_address, UNKNOWN_ADDRESS);
        assert_eq!(weth.decimals, DEFAULT_DECIMALS);
        assert_eq!(weth.network.name, "Base");

        let usdc = &position.tokens[1].token;
        assert_eq!(usdc.balance, 0.0);
        assert_eq!(usdc.balance_raw, "not-a-number");
    }

    #[test]
    fn app_token_position_becomes_single_leg() {
        let node: PositionNode = serde_json::from_value(json!({
            "type": "app-token",
            "symbol": "aBasUSDC",
            "balance": 12,
            "balanceUSD": 12.1,
            "price": null,
            "groupLabel": "Lending",
            "displayProps": { "label": "USDC", "images": ["a.png"] }
        }))
        .unwrap();

        let position = contract_position(node, &Network::base());
        assert_eq!(position.address, "Lending");
        assert_eq!(position.position_type, "app-token");
        assert_eq!(position.tokens.len(), 1);
        assert_eq!(position.tokens[0].meta_type, "app-token");
        assert_eq!(position.tokens[0].token.symbol, "aBasUSDC");
        assert_eq!(position.tokens[0].token.price, 0.0);
        assert_eq!(position.tokens[0].token.balance, 12.0);
    }

    #[test]
    fn null_portfolio_decodes_to_empty_balances() {
        let data: TokenBalancesData =
            serde_json::from_value(json!({ "portfolioV2": null })).unwrap();
        let balances = token_balances(data.portfolio_v2.token_balances);
        assert!(balances.by_token.is_empty());
        assert_eq!(balances.total_balance_usd, 0.0);
    }

    fn leg(symbol: &str) -> TokenPosition {
        TokenPosition {
            meta_type: "SUPPLIED".to_string(),
            token: leg_balance(symbol.to_string(), None, None, 0.0, &Network::base()),
        }
    }

    fn position(label: &str, tokens: Vec<TokenPosition>) -> ContractPosition {
        ContractPosition {
            address: label.to_string(),
            position_type: "contract-position".to_string(),
            balance_usd: 0.0,
            tokens,
            display_props: DisplayProps::default(),
        }
    }

    #[test]
    fn positions_listing_keeps_only_multi_leg_positions() {
        let snapshot = PortfolioSnapshot {
            token_balances: TokenBalances::default(),
            app_balances: AppBalances {
                total_balance_usd: 0.0,
                by_app: vec![AppBalance {
                    app: App {
                        display_name: "Uniswap V3".to_string(),
                        slug: "dex".to_string(),
                    },
                    network: Network::base(),
                    balances: vec![
                        position("WETH/USDC", vec![leg("WETH"), leg("USDC")]),
                        position("Staked", vec![leg("AERO")]),
                    ],
                }],
            },
        };

        let positions = positions_from_snapshot(&owner(), &snapshot);
        assert_eq!(positions.len(), 1);
        let listed = &positions[0];
        assert_eq!(listed.id, "WETH/USDC");
        assert_eq!(listed.owner, owner().to_string());
        assert_eq!(listed.pool.token0.symbol, "WETH");
        assert_eq!(listed.pool.token1.symbol, "USDC");
        assert_eq!(listed.pool.token0.decimals, "18");
        assert_eq!(listed.pool.token0.id, UNKNOWN_ADDRESS);
        assert_eq!(listed.pool.fee_tier, DEFAULT_FEE_TIER);
        assert_eq!(listed.liquidity, DEFAULT_LIQUIDITY);
    }
}
