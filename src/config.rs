use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

use crate::providers::{open_food_facts, usda};

#[derive(Debug, Clone)]
pub struct OpenFoodFactsSettings {
    pub base_url: String,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct UsdaSettings {
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cache_ttl: Duration,
    pub cache_max_entries: u64,
    pub provider_timeout: Duration,
    pub open_food_facts: OpenFoodFactsSettings,
    pub usda: UsdaSettings,
}

fn parse_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{name} is not a valid value: {raw:?}")),
        _ => Ok(default),
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

pub fn default_user_agent() -> String {
    format!("foodmind/{}", env!("CARGO_PKG_VERSION"))
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = non_empty_var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_or("APP_PORT", 8080u16)?;
        let cache_ttl = Duration::from_secs(parse_or("CACHE_TTL_SECONDS", 300u64)?);
        let cache_max_entries = parse_or("CACHE_MAX_ENTRIES", 10_000u64)?;
        let provider_timeout = Duration::from_secs(parse_or("PROVIDER_TIMEOUT_SECONDS", 8u64)?);
        let open_food_facts = OpenFoodFactsSettings {
            base_url: non_empty_var("OFF_BASE_URL")
                .unwrap_or_else(|| open_food_facts::DEFAULT_BASE_URL.into()),
            user_agent: non_empty_var("OFF_USER_AGENT").unwrap_or_else(default_user_agent),
        };
        let usda = UsdaSettings {
            base_url: non_empty_var("USDA_BASE_URL").unwrap_or_else(|| usda::DEFAULT_BASE_URL.into()),
            api_key: non_empty_var("USDA_API_KEY"),
        };
        Ok(Self {
            host,
            port,
            cache_ttl,
            cache_max_entries,
            provider_timeout,
            open_food_facts,
            usda,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            cache_ttl: Duration::from_secs(300),
            cache_max_entries: 10_000,
            provider_timeout: Duration::from_secs(8),
            open_food_facts: OpenFoodFactsSettings {
                base_url: open_food_facts::DEFAULT_BASE_URL.into(),
                user_agent: default_user_agent(),
            },
            usda: UsdaSettings {
                base_url: usda::DEFAULT_BASE_URL.into(),
                api_key: None,
            },
        }
    }
}
