use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{FetchedTrade, MarketInfo, MirrorOrder, Side};

/// Read-only view of the prediction market.
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Trades made by `address` at or after `since`, oldest first.
    async fn trades_for_wallet(
        &self,
        address: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<FetchedTrade>>;

    async fn market_info(&self, market_id: &str) -> anyhow::Result<MarketInfo>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub market_id: String,
    pub outcome_id: String,
    pub side: Side,
    pub size: Decimal,
    pub max_price: Decimal,
}

impl From<&MirrorOrder> for OrderRequest {
    fn from(order: &MirrorOrder) -> Self {
        Self {
            market_id: order.market_id.clone(),
            outcome_id: order.outcome_id.clone(),
            side: order.side,
            size: order.size,
            max_price: order.max_price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    pub success: bool,
    pub order_id: Option<String>,
    pub error: Option<String>,
    /// Average fill price if the venue reported one.
    pub fill_price: Option<Decimal>,
}

impl OrderResult {
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            order_id: None,
            error: Some(error.into()),
            fill_price: None,
        }
    }
}

/// Live order placement. Implementations must not retry on their own.
#[async_trait]
pub trait TradingPort: Send + Sync {
    async fn place_order(&self, request: &OrderRequest) -> anyhow::Result<OrderResult>;
}
