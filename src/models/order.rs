use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Side;

/// A sized, price-capped order produced by the strategy engine.
/// Never persisted; it lives only for one pass through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorOrder {
    /// The leader trade this order mirrors.
    pub leader_trade_id: Uuid,
    pub market_id: String,
    pub outcome_id: String,
    pub side: Side,
    /// Shares, rounded to 4 decimal places.
    pub size: Decimal,
    /// Slippage ceiling: the most the executor may pay per share.
    pub max_price: Decimal,
}

impl MirrorOrder {
    /// Worst-case USD value of the order.
    pub fn notional(&self) -> Decimal {
        self.size * self.max_price
    }
}
