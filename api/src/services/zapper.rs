use async_trait::async_trait;
use domain::{AppBalances, PortfolioSnapshot, TokenBalances, WalletAddress};
use indexer::{PortfolioError, PortfolioResult, PortfolioSource};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use super::normalize::{self, AppBalancesData, TokenBalancesData};

pub const BASE_CHAIN_ID: u64 = 8453;
pub const TOKEN_LIMIT: u32 = 5;
pub const APP_LIMIT: u32 = 5;

const API_KEY_HEADER: &str = "x-zapper-api-key";
const TOKEN_BALANCES: &str = "token balances";
const APP_BALANCES: &str = "app balances";

pub const TOKEN_BALANCES_QUERY: &str = r#"query TokenBalances($addresses: [Address!]!, $first: Int, $chainIds: [Int!]) {
  portfolioV2(addresses: $addresses, chainIds: $chainIds) {
    tokenBalances {
      totalBalanceUSD
      byToken(first: $first) {
        totalCount
        edges {
          node {
            name
            symbol
            price
            tokenAddress
            imgUrlV2
            decimals
            balanceRaw
            balance
            balanceUSD
            onchainMarketData {
              priceChange24h
              marketCap
            }
          }
        }
      }
    }
  }
}"#;

pub const APP_BALANCES_QUERY: &str = r#"query AppBalances($addresses: [Address!]!, $first: Int = 10) {
  portfolioV2(addresses: $addresses) {
    appBalances {
      totalBalanceUSD
      byApp(first: $first) {
        totalCount
        edges {
          node {
            balanceUSD
            app {
              displayName
              imgUrl
              description
              category {
                name
              }
            }
            network {
              name
              chainId
            }
            positionBalances(first: 10) {
              edges {
                node {
                  ... on AppTokenPositionBalance {
                    type
                    symbol
                    balance
                    balanceUSD
                    price
                    groupLabel
                    displayProps {
                      label
                      images
                    }
                  }
                  ... on ContractPositionBalance {
                    type
                    balanceUSD
                    groupLabel
                    tokens {
                      metaType
                      token {
                        ... on BaseTokenPositionBalance {
                          symbol
                          balance
                          balanceUSD
                        }
                      }
                    }
                    displayProps {
                      label
                      images
                    }
                  }
                }
              }
            }
          }
        }
      }
    }
  }
}"#;

#[derive(Serialize)]
struct GraphQlRequest<'a, V> {
    query: &'a str,
    variables: V,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenBalancesVariables<'a> {
    addresses: [&'a str; 1],
    first: u32,
    chain_ids: [u64; 1],
}

#[derive(Serialize)]
struct AppBalancesVariables<'a> {
    addresses: [&'a str; 1],
    first: u32,
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
}

#[derive(Deserialize)]
struct GraphQlErrors {
    #[serde(default)]
    errors: Option<Vec<serde_json::Value>>,
}

/// Client for the Zapper `portfolioV2` GraphQL API.
#[derive(Clone)]
pub struct ZapperClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
}

impl ZapperClient {
    pub fn new(client: Client, api_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            api_key,
        }
    }

    pub async fn fetch_token_balances(
        &self,
        address: &WalletAddress,
    ) -> PortfolioResult<TokenBalances> {
        let variables = TokenBalancesVariables {
            addresses: [address.as_str()],
            first: TOKEN_LIMIT,
            chain_ids: [BASE_CHAIN_ID],
        };
        let data: TokenBalancesData = self
            .post_query(TOKEN_BALANCES, TOKEN_BALANCES_QUERY, variables)
            .await?;
        Ok(normalize::token_balances(data.portfolio_v2.token_balances))
    }

    pub async fn fetch_app_balances(
        &self,
        address: &WalletAddress,
    ) -> PortfolioResult<AppBalances> {
        let variables = AppBalancesVariables {
            addresses: [address.as_str()],
            first: APP_LIMIT,
        };
        let data: AppBalancesData = self
            .post_query(APP_BALANCES, APP_BALANCES_QUERY, variables)
            .await?;
        Ok(normalize::app_balances(data.portfolio_v2.app_balances))
    }

    async fn post_query<V, T>(
        &self,
        query: &'static str,
        document: &str,
        variables: V,
    ) -> PortfolioResult<T>
    where
        V: Serialize,
        T: DeserializeOwned + Default,
    {
        let api_key = self.api_key.as_deref().ok_or(PortfolioError::MissingApiKey)?;

        let resp = self
            .client
            .post(&self.api_url)
            .header(API_KEY_HEADER, api_key)
            .json(&GraphQlRequest {
                query: document,
                variables,
            })
            .send()
            .await
            .map_err(|err| {
                record_outcome(query, "transport_error");
                PortfolioError::Transport {
                    query,
                    message: err.to_string(),
                }
            })?;
        let status = resp.status();
        let body = resp.text().await.map_err(|err| {
            record_outcome(query, "transport_error");
            PortfolioError::Transport {
                query,
                message: format!("failed to read response body: {err}"),
            }
        })?;
        debug!(query, %status, body = %body, "zapper response received");

        // GraphQL errors win over the HTTP status: a 200 with errors is still a failure.
        if let Some(messages) = graphql_error_messages(&body) {
            record_outcome(query, "graphql_error");
            warn!(query, errors = messages.len(), "zapper returned GraphQL errors");
            return Err(PortfolioError::GraphQl { query, messages });
        }
        if !status.is_success() {
            record_outcome(query, "status_error");
            return Err(PortfolioError::Status {
                query,
                status: status.as_u16(),
                body,
            });
        }

        let envelope: GraphQlResponse<T> = serde_json::from_str(&body).map_err(|err| {
            record_outcome(query, "decode_error");
            PortfolioError::Decode {
                query,
                message: err.to_string(),
            }
        })?;
        record_outcome(query, "ok");
        Ok(envelope.data.unwrap_or_default())
    }
}

#[async_trait]
impl PortfolioSource for ZapperClient {
    async fn fetch_portfolio(
        &self,
        address: &WalletAddress,
    ) -> PortfolioResult<PortfolioSnapshot> {
        let token_balances = self.fetch_token_balances(address).await?;
        let app_balances = self.fetch_app_balances(address).await?;
        debug!(
            %address,
            tokens = token_balances.by_token.len(),
            apps = app_balances.by_app.len(),
            "portfolio fetched"
        );
        Ok(PortfolioSnapshot {
            token_balances,
            app_balances,
        })
    }
}

fn graphql_error_messages(body: &str) -> Option<Vec<String>> {
    let errors = serde_json::from_str::<GraphQlErrors>(body).ok()?.errors?;
    if errors.is_empty() {
        return None;
    }
    Some(
        errors
            .iter()
            .map(|entry| {
                entry
                    .get("message")
                    .and_then(|message| message.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| entry.to_string())
            })
            .collect(),
    )
}

fn record_outcome(query: &'static str, outcome: &'static str) {
    metrics::counter!(
        "upstream_requests_total",
        "upstream" => "zapper",
        "query" => query,
        "outcome" => outcome
    )
    .increment(1);
}
