use std::env;

use anyhow::{Context, Result};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ZAPPER_API_URL: &str = "https://public.zapper.xyz/graphql";
pub const DEFAULT_RISK_ADVISOR_URL: &str = "http://localhost:8000/api/analyze";
pub const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:8081";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub zapper_api_url: String,
    pub zapper_api_key: Option<String>,
    pub risk_advisor_url: String,
    pub frontend_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            zapper_api_url: DEFAULT_ZAPPER_API_URL.to_string(),
            zapper_api_key: None,
            risk_advisor_url: DEFAULT_RISK_ADVISOR_URL.to_string(),
            frontend_origins: vec![DEFAULT_FRONTEND_ORIGIN.to_string()],
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let port = match non_empty_var("PORT") {
            Some(raw) => raw.parse().context("PORT must be a valid u16")?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            zapper_api_url: non_empty_var("ZAPPER_API_URL")
                .unwrap_or_else(|| DEFAULT_ZAPPER_API_URL.to_string()),
            // 缺少 key 不阻擋啟動，請求時才回報錯誤
            zapper_api_key: non_empty_var("ZAPPER_API_KEY"),
            risk_advisor_url: non_empty_var("RISK_ADVISOR_URL")
                .unwrap_or_else(|| DEFAULT_RISK_ADVISOR_URL.to_string()),
            frontend_origins: parse_origins(),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_origins() -> Vec<String> {
    let origins = if let Ok(list) = env::var("FRONTEND_ORIGINS") {
        split_origins(&list)
    } else if let Ok(origin) = env::var("FRONTEND_ORIGIN") {
        split_origins(&origin)
    } else {
        Vec::new()
    };
    if origins.is_empty() {
        vec![DEFAULT_FRONTEND_ORIGIN.to_string()]
    } else {
        origins
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|item| {
            let trimmed = item.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_origins_drops_blank_entries() {
        assert_eq!(
            split_origins(" http://localhost:8081, ,http://127.0.0.1:8081 ,"),
            vec![
                "http://localhost:8081".to_string(),
                "http://127.0.0.1:8081".to_string()
            ]
        );
    }

    #[test]
    fn default_config_points_at_local_advisor() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.risk_advisor_url, "http://localhost:8000/api/analyze");
        assert!(config.zapper_api_key.is_none());
        assert_eq!(config.frontend_origins, vec!["http://localhost:8081"]);
    }
}
