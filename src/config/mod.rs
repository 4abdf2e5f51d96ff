use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::polymarket::data_client::DATA_API_BASE;
use crate::polymarket::gamma_client::GAMMA_API_BASE;
use crate::services::wallet_monitor::MonitorConfig;

const DEFAULT_CLOB_URL: &str = "https://clob.polymarket.com";

/// Process configuration. Trading settings live in the ledger, not here.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Absent → in-memory ledger.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub api_token: Option<String>,
    pub json_logs: bool,

    // Polymarket endpoints
    pub data_api_url: String,
    pub gamma_api_url: String,
    pub clob_url: String,
    /// Signing key for LIVE orders. Without it every LIVE order fails.
    pub private_key: Option<String>,

    // Monitor
    pub poll_interval_secs: u64,
    pub initial_lookback_secs: i64,
    pub scan_overlap_secs: i64,
    pub trade_fetch_limit: u32,
    pub market_cache_ttl_secs: u64,
    pub http_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: non_empty("DATABASE_URL"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            api_token: non_empty("API_TOKEN"),
            json_logs: env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")),

            data_api_url: env::var("POLYMARKET_DATA_API_URL")
                .unwrap_or_else(|_| DATA_API_BASE.into()),
            gamma_api_url: env::var("POLYMARKET_GAMMA_API_URL")
                .unwrap_or_else(|_| GAMMA_API_BASE.into()),
            clob_url: env::var("POLYMARKET_CLOB_URL").unwrap_or_else(|_| DEFAULT_CLOB_URL.into()),
            private_key: non_empty("POLYMARKET_PRIVATE_KEY"),

            poll_interval_secs: parse_or("POLL_INTERVAL_SECS", 30)?,
            initial_lookback_secs: parse_or("INITIAL_LOOKBACK_SECS", 3600)?,
            scan_overlap_secs: parse_or("SCAN_OVERLAP_SECS", 60)?,
            trade_fetch_limit: parse_or("TRADE_FETCH_LIMIT", 100)?,
            market_cache_ttl_secs: parse_or("MARKET_CACHE_TTL_SECS", 300)?,
            http_timeout_secs: parse_or("HTTP_TIMEOUT_SECS", 10)?,
        })
    }

    /// Returns true if live trading credentials are configured.
    pub fn has_trading_credentials(&self) -> bool {
        self.private_key.is_some()
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            initial_lookback: chrono::Duration::seconds(self.initial_lookback_secs),
            scan_overlap: chrono::Duration::seconds(self.scan_overlap_secs),
        }
    }

    pub fn market_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.market_cache_ttl_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            host: "0.0.0.0".into(),
            port: 8080,
            api_token: None,
            json_logs: false,
            data_api_url: DATA_API_BASE.into(),
            gamma_api_url: GAMMA_API_BASE.into(),
            clob_url: DEFAULT_CLOB_URL.into(),
            private_key: None,
            poll_interval_secs: 30,
            initial_lookback_secs: 3600,
            scan_overlap_secs: 60,
            trade_fetch_limit: 100,
            market_cache_ttl_secs: 300,
            http_timeout_secs: 10,
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match non_empty(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} is invalid: {e}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_config_from_defaults() {
        let monitor = AppConfig::default().monitor_config();
        assert_eq!(monitor.poll_interval, Duration::from_secs(30));
        assert_eq!(monitor.initial_lookback, chrono::Duration::hours(1));
        assert_eq!(monitor.scan_overlap, chrono::Duration::seconds(60));
    }

    #[test]
    fn test_no_key_means_no_credentials() {
        assert!(!AppConfig::default().has_trading_credentials());
    }
}
