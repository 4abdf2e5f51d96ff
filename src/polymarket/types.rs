use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{FetchedTrade, Side};

// ---------------------------------------------------------------------------
// Trade (Data API, REST)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTrade {
    #[serde(default)]
    pub proxy_wallet: Option<String>,
    pub side: String,
    /// CTF token id of the traded outcome.
    pub asset: String,
    pub condition_id: String,
    pub size: Decimal,
    pub price: Decimal,
    /// Unix seconds.
    pub timestamp: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub event_slug: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
}

impl ApiTrade {
    pub fn executed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }

    /// Stable id for idempotent ingestion. One transaction can fill several
    /// outcomes, so the asset and side are part of the key.
    pub fn external_id(&self) -> String {
        match &self.transaction_hash {
            Some(hash) if !hash.is_empty() => {
                format!("{}:{}:{}", hash.to_lowercase(), self.asset, self.side.to_uppercase())
            }
            _ => format!(
                "{}:{}:{}:{}:{}",
                self.condition_id, self.asset, self.side.to_uppercase(), self.size, self.timestamp
            ),
        }
    }

    /// Convert into the port type. Returns `None` for rows that cannot be
    /// mirrored (unknown side or bad timestamp).
    pub fn into_fetched(self) -> Option<FetchedTrade> {
        let side = Side::from_api_str(&self.side)?;
        let executed_at = self.executed_at()?;
        Some(FetchedTrade {
            external_trade_id: self.external_id(),
            market_id: self.condition_id,
            outcome_id: self.asset,
            side,
            size: self.size,
            price: self.price,
            executed_at,
            category: self.event_slug,
        })
    }
}

// ---------------------------------------------------------------------------
// Market (Gamma API)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GammaMarket {
    #[serde(alias = "conditionId")]
    pub condition_id: String,
    #[serde(default)]
    pub question: Option<String>,
    /// Lifetime volume, sent as a decimal string.
    #[serde(default)]
    pub volume: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub closed: Option<bool>,
    #[serde(default, alias = "endDate")]
    pub end_date: Option<String>,
}

impl GammaMarket {
    pub fn volume(&self) -> Decimal {
        self.volume
            .as_deref()
            .and_then(|v| v.parse::<Decimal>().ok().or_else(|| Decimal::from_scientific(v).ok()))
            .unwrap_or(Decimal::ZERO)
    }

    pub fn is_open(&self) -> bool {
        self.active.unwrap_or(false) && !self.closed.unwrap_or(false)
    }

    pub fn resolution_time(&self) -> Option<DateTime<Utc>> {
        let raw = self.end_date.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()?
                    .and_hms_opt(0, 0, 0)
                    .map(|dt| dt.and_utc())
            })
    }
}
