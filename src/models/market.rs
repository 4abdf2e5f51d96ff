use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Side;

/// A leader trade as reported by the market-data port, before ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedTrade {
    pub external_trade_id: String,
    pub market_id: String,
    pub outcome_id: String,
    pub side: Side,
    pub size: Decimal,
    pub price: Decimal,
    pub executed_at: DateTime<Utc>,
    pub category: Option<String>,
}

/// Market metadata used by the strategy filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketInfo {
    pub volume: Decimal,
    pub resolution_time: Option<DateTime<Utc>>,
    pub is_active: bool,
}
