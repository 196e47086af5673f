//! Environment-driven runtime configuration (loaded after `dotenvy::dotenv()`).

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use crate::domain::common::model::ChartDefinition;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 4001;
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_FIXTURE_DIR: &str = "data";
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;
pub const DEFAULT_OVERVIEW_COLLECTIONS: &[&str] =
    &["users", "bookings", "sessions", "feedback", "enquiries"];

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    pub log_dir: PathBuf,
    /// Base URL of the document gateway; fixture mode when unset.
    pub store_url: Option<String>,
    pub store_token: Option<String>,
    pub fixture_dir: PathBuf,
    /// Bearer token -> user id.
    pub api_tokens: HashMap<String, String>,
    pub history_capacity: usize,
    pub overview_collections: Vec<String>,
    pub charts: Vec<ChartDefinition>,
    pub debug_mode: bool,
    pub debug_query_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = get("ANALYTICS_HOST")
            .unwrap_or_else(|| DEFAULT_HOST.to_string())
            .parse::<IpAddr>()
            .context("ANALYTICS_HOST must be an IP address")?;

        let port = match get("ANALYTICS_PORT") {
            Some(raw) => raw.parse::<u16>().context("ANALYTICS_PORT must be a port number")?,
            None => DEFAULT_PORT,
        };

        let history_capacity = match get("ANALYTICS_HISTORY_CAPACITY") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| anyhow!("ANALYTICS_HISTORY_CAPACITY must be a positive integer"))?,
            None => DEFAULT_HISTORY_CAPACITY,
        };

        let overview_collections = match get("ANALYTICS_OVERVIEW_COLLECTIONS") {
            Some(raw) => split_list(&raw),
            None => DEFAULT_OVERVIEW_COLLECTIONS.iter().map(|s| s.to_string()).collect(),
        };

        let charts = match get("ANALYTICS_CHARTS") {
            Some(raw) => parse_charts(&raw)?,
            None => ChartDefinition::defaults(),
        };

        Ok(Self {
            host,
            port,
            log_dir: PathBuf::from(get("ANALYTICS_LOG_DIR").unwrap_or_else(|| DEFAULT_LOG_DIR.into())),
            store_url: get("ANALYTICS_STORE_URL"),
            store_token: get("ANALYTICS_STORE_TOKEN"),
            fixture_dir: PathBuf::from(
                get("ANALYTICS_FIXTURE_DIR").unwrap_or_else(|| DEFAULT_FIXTURE_DIR.into()),
            ),
            api_tokens: parse_tokens(get("ANALYTICS_API_TOKENS").as_deref().unwrap_or_default())?,
            history_capacity,
            overview_collections,
            charts,
            debug_mode: get("ANALYTICS_DEBUG_MODE")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            debug_query_file: get("ANALYTICS_DEBUG_QUERY_FILE").map(PathBuf::from),
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `token=uid,token2=uid2`
fn parse_tokens(raw: &str) -> Result<HashMap<String, String>> {
    split_list(raw)
        .into_iter()
        .map(|pair| {
            let (token, uid) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("ANALYTICS_API_TOKENS entry '{}' must be token=uid", pair))?;
            Ok((token.trim().to_string(), uid.trim().to_string()))
        })
        .collect()
}

/// `id:collection:field[:cumulative]`, comma separated.
fn parse_charts(raw: &str) -> Result<Vec<ChartDefinition>> {
    split_list(raw)
        .into_iter()
        .map(|entry| {
            let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
            match parts.as_slice() {
                [id, collection, field] => Ok(ChartDefinition::new(id, collection, field, false)),
                [id, collection, field, "cumulative"] => {
                    Ok(ChartDefinition::new(id, collection, field, true))
                }
                _ => Err(anyhow!(
                    "ANALYTICS_CHARTS entry '{}' must be id:collection:field[:cumulative]",
                    entry
                )),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_with(&[]).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.overview_collections.len(), 5);
        assert!(config.store_url.is_none());
        assert!(config.api_tokens.is_empty());
        assert!(!config.charts.is_empty());
        assert!(!config.debug_mode);
    }

    #[test]
    fn parses_tokens_and_charts() {
        let config = config_with(&[
            ("ANALYTICS_API_TOKENS", "abc=admin1, def=user2"),
            ("ANALYTICS_CHARTS", "signups:users:dateCreated,total:users:dateCreated:cumulative"),
            ("ANALYTICS_DEBUG_MODE", "true"),
        ])
        .unwrap();

        assert_eq!(config.api_tokens.get("abc").map(String::as_str), Some("admin1"));
        assert_eq!(config.api_tokens.get("def").map(String::as_str), Some("user2"));
        assert_eq!(config.charts.len(), 2);
        assert!(!config.charts[0].cumulative);
        assert!(config.charts[1].cumulative);
        assert!(config.debug_mode);
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(config_with(&[("ANALYTICS_PORT", "http")]).is_err());
        assert!(config_with(&[("ANALYTICS_HISTORY_CAPACITY", "0")]).is_err());
        assert!(config_with(&[("ANALYTICS_API_TOKENS", "no-separator")]).is_err());
        assert!(config_with(&[("ANALYTICS_CHARTS", "only:two")]).is_err());
    }
}
