use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{ParseEnumError, Side};

/// A trade observed on a leader wallet. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderTrade {
    pub id: Uuid,
    pub external_trade_id: String,
    pub wallet_id: Uuid,
    pub market_id: String,
    pub outcome_id: String,
    pub side: Side,
    pub size: Decimal,
    pub price: Decimal,
    pub executed_at: DateTime<Utc>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a leader trade.
#[derive(Debug, Clone)]
pub struct NewLeaderTrade {
    pub external_trade_id: String,
    pub wallet_id: Uuid,
    pub market_id: String,
    pub outcome_id: String,
    pub side: Side,
    pub size: Decimal,
    pub price: Decimal,
    pub executed_at: DateTime<Utc>,
    pub category: Option<String>,
}

impl NewLeaderTrade {
    pub fn into_trade(self, id: Uuid, created_at: DateTime<Utc>) -> LeaderTrade {
        LeaderTrade {
            id,
            external_trade_id: self.external_trade_id,
            wallet_id: self.wallet_id,
            market_id: self.market_id,
            outcome_id: self.outcome_id,
            side: self.side,
            size: self.size,
            price: self.price,
            executed_at: self.executed_at,
            category: self.category,
            created_at,
        }
    }
}

/// Terminal state of a mirrored execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FollowerTradeStatus {
    Simulated,
    Executed,
    Failed,
}

impl FollowerTradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowerTradeStatus::Simulated => "SIMULATED",
            FollowerTradeStatus::Executed => "EXECUTED",
            FollowerTradeStatus::Failed => "FAILED",
        }
    }

    /// Whether this attempt moved shares and must be reflected in positions.
    pub fn is_filled(&self) -> bool {
        !matches!(self, FollowerTradeStatus::Failed)
    }
}

impl fmt::Display for FollowerTradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FollowerTradeStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SIMULATED" => Ok(FollowerTradeStatus::Simulated),
            "EXECUTED" => Ok(FollowerTradeStatus::Executed),
            "FAILED" => Ok(FollowerTradeStatus::Failed),
            _ => Err(ParseEnumError {
                kind: "follower trade status",
                value: s.to_string(),
            }),
        }
    }
}

/// A mirrored execution attempt on the managed account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowerTrade {
    pub id: Uuid,
    pub leader_trade_id: Option<Uuid>,
    pub market_id: String,
    pub outcome_id: String,
    pub side: Side,
    pub size: Decimal,
    pub price: Decimal,
    pub status: FollowerTradeStatus,
    pub is_dry_run: bool,
    pub pnl: Decimal,
    pub order_id: Option<String>,
    pub error_message: Option<String>,
    pub executed_at: DateTime<Utc>,
}

/// Insert payload for a follower trade. `pnl` is filled in by the ledger
/// when the position update is applied.
#[derive(Debug, Clone)]
pub struct NewFollowerTrade {
    pub leader_trade_id: Uuid,
    pub market_id: String,
    pub outcome_id: String,
    pub side: Side,
    pub size: Decimal,
    pub price: Decimal,
    pub status: FollowerTradeStatus,
    pub is_dry_run: bool,
    pub order_id: Option<String>,
    pub error_message: Option<String>,
    pub executed_at: DateTime<Utc>,
}

impl NewFollowerTrade {
    pub fn into_trade(self, id: Uuid, pnl: Decimal) -> FollowerTrade {
        FollowerTrade {
            id,
            leader_trade_id: Some(self.leader_trade_id),
            market_id: self.market_id,
            outcome_id: self.outcome_id,
            side: self.side,
            size: self.size,
            price: self.price,
            status: self.status,
            is_dry_run: self.is_dry_run,
            pnl,
            order_id: self.order_id,
            error_message: self.error_message,
            executed_at: self.executed_at,
        }
    }
}
