use reqwest::{Client, Url};
use thiserror::Error;

use super::types::GammaMarket;

pub const GAMMA_API_BASE: &str = "https://gamma-api.polymarket.com";

#[derive(Debug, Error)]
pub enum GammaClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid request URL: {0}")]
    Url(String),
}

#[derive(Debug, Clone)]
pub struct GammaClient {
    http: Client,
    base_url: String,
}

impl GammaClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Look up one market by condition id. Returns `None` if Gamma does not
    /// know it.
    pub async fn get_market(
        &self,
        condition_id: &str,
    ) -> Result<Option<GammaMarket>, GammaClientError> {
        let url = Url::parse_with_params(
            &format!("{}/markets", self.base_url.trim_end_matches('/')),
            &[("condition_ids", condition_id)],
        )
        .map_err(|e| GammaClientError::Url(e.to_string()))?;

        let resp = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?;

        let markets: Vec<GammaMarket> = resp.json().await?;
        Ok(markets
            .into_iter()
            .find(|m| m.condition_id.eq_ignore_ascii_case(condition_id)))
    }
}
