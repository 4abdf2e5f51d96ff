use reqwest::{Client, Url};
use thiserror::Error;

use super::types::ApiTrade;

pub const DATA_API_BASE: &str = "https://data-api.polymarket.com";

#[derive(Debug, Error)]
pub enum DataClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid request URL: {0}")]
    Url(String),
}

#[derive(Debug, Clone)]
pub struct DataClient {
    http: Client,
    base_url: String,
}

impl DataClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Fetch the most recent trades made by a wallet, newest first.
    pub async fn get_trades_by_wallet(
        &self,
        wallet: &str,
        limit: u32,
    ) -> Result<Vec<ApiTrade>, DataClientError> {
        let limit = limit.to_string();
        let url = Url::parse_with_params(
            &format!("{}/trades", self.base_url.trim_end_matches('/')),
            &[("user", wallet), ("limit", limit.as_str())],
        )
        .map_err(|e| DataClientError::Url(e.to_string()))?;

        let resp = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?;

        let trades: Vec<ApiTrade> = resp.json().await?;
        Ok(trades)
    }
}
