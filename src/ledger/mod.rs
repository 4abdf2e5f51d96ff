//! Durable state behind one async trait.
//!
//! [`MemoryLedger`] keeps everything in process and backs the tests and the
//! no-database mode; [`crate::db::PgLedger`] is the Postgres implementation.

pub mod memory;

pub use memory::MemoryLedger;

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{
    FollowerTrade, LeaderTrade, LeaderWallet, NewFollowerTrade, NewLeaderTrade, NewSystemEvent,
    Position, PositionChange, Settings, SystemEvent,
};

/// Point-in-time figures the risk manager checks an order against.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LedgerSnapshot {
    /// Distinct markets with an open position.
    pub open_markets: i64,
    /// Σ(size × average_price) over positions in the order's market.
    pub market_exposure: Decimal,
    /// Σ pnl of follower trades executed since the start of the UTC day.
    pub daily_pnl: Decimal,
    /// Follower trades (any status) in the trailing hour.
    pub trades_last_hour: i64,
}

/// Result of recording one execution attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionRecord {
    pub trade: FollowerTrade,
    pub position: PositionChange,
}

/// Headline figures for the operator dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TradingStats {
    pub total_trades: i64,
    /// Follower trades with pnl > 0.
    pub profitable_trades: i64,
    /// Σ pnl over profitable trades.
    pub total_profit: Decimal,
    /// Percent of all follower trades that were profitable.
    pub win_rate: Decimal,
    pub active_wallets: i64,
}

impl TradingStats {
    pub fn new(
        total_trades: i64,
        profitable_trades: i64,
        total_profit: Decimal,
        active_wallets: i64,
    ) -> Self {
        let win_rate = if total_trades > 0 {
            (Decimal::from(profitable_trades) * Decimal::ONE_HUNDRED / Decimal::from(total_trades))
                .round_dp(1)
        } else {
            Decimal::ZERO
        };

        Self {
            total_trades,
            profitable_trades,
            total_profit: total_profit.round_dp(2),
            win_rate,
            active_wallets,
        }
    }
}

/// Rows removed by an analytics reset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyticsReset {
    pub follower_trades: u64,
    pub leader_trades: u64,
    pub positions: u64,
    pub wallets_rewound: u64,
}

#[async_trait]
pub trait TradeLedger: Send + Sync {
    /// Cheap connectivity probe for health checks.
    async fn ping(&self) -> anyhow::Result<()>;

    // ---- Wallets ----

    async fn list_wallets(&self, active_only: bool) -> anyhow::Result<Vec<LeaderWallet>>;

    async fn find_wallet_by_address(&self, address: &str) -> anyhow::Result<Option<LeaderWallet>>;

    /// `None` when the address is already stored.
    async fn insert_wallet(
        &self,
        address: &str,
        nickname: Option<&str>,
    ) -> anyhow::Result<Option<LeaderWallet>>;

    /// Returns `None` when no wallet has this id.
    async fn set_wallet_active(
        &self,
        id: Uuid,
        is_active: bool,
    ) -> anyhow::Result<Option<LeaderWallet>>;

    async fn set_last_monitored(&self, id: Uuid, at: DateTime<Utc>) -> anyhow::Result<()>;

    // ---- Leader trades ----

    /// Insert unless the external id is already stored. `None` means the
    /// trade was a duplicate and nothing was written.
    async fn insert_leader_trade(&self, trade: NewLeaderTrade)
        -> anyhow::Result<Option<LeaderTrade>>;

    async fn list_leader_trades(&self, limit: i64) -> anyhow::Result<Vec<LeaderTrade>>;

    // ---- Follower trades and positions ----

    /// Store the follower trade and apply it to its position as one atomic
    /// step, serialised per (market_id, outcome_id). Failed attempts are
    /// stored without touching positions.
    async fn record_execution(&self, trade: NewFollowerTrade) -> anyhow::Result<ExecutionRecord>;

    async fn list_follower_trades(&self, limit: i64) -> anyhow::Result<Vec<FollowerTrade>>;

    async fn count_follower_trades_since(&self, since: DateTime<Utc>) -> anyhow::Result<i64>;

    async fn list_positions(&self) -> anyhow::Result<Vec<Position>>;

    async fn risk_snapshot(
        &self,
        market_id: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<LedgerSnapshot>;

    async fn trading_stats(&self) -> anyhow::Result<TradingStats>;

    // ---- Settings ----

    /// Load the settings row, creating it with defaults on first access.
    async fn load_settings(&self) -> anyhow::Result<Settings>;

    async fn save_settings(&self, settings: &Settings) -> anyhow::Result<Settings>;

    // ---- Events ----

    async fn record_event(&self, event: NewSystemEvent) -> anyhow::Result<SystemEvent>;

    async fn list_events(&self, limit: i64) -> anyhow::Result<Vec<SystemEvent>>;

    // ---- Maintenance ----

    /// Delete follower trades, leader trades and positions, and clear every
    /// wallet's `last_monitored`.
    async fn reset_analytics(&self) -> anyhow::Result<AnalyticsReset>;
}

/// Midnight UTC of the day containing `now`.
pub fn day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_day_start_truncates_to_utc_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 17, 45, 12).unwrap();
        assert_eq!(day_start(now), Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_win_rate_rounds_to_one_place() {
        let stats = TradingStats::new(3, 1, Decimal::new(12345, 3), 2);
        assert_eq!(stats.win_rate, Decimal::new(333, 1));
        assert_eq!(stats.total_profit, Decimal::new(1235, 2));
    }

    #[test]
    fn test_win_rate_without_trades_is_zero() {
        assert_eq!(TradingStats::new(0, 0, Decimal::ZERO, 1).win_rate, Decimal::ZERO);
    }
}
