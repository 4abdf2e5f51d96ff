use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::ledger::{
    day_start, AnalyticsReset, ExecutionRecord, LedgerSnapshot, TradeLedger, TradingStats,
};
use crate::models::{
    apply_fill, FollowerTrade, LeaderTrade, LeaderWallet, NewFollowerTrade, NewLeaderTrade,
    NewSystemEvent, Position, PositionChange, Settings, Side, SystemEvent,
};

use super::{event_repo, follower_repo, position_repo, settings_repo, trade_repo, wallet_repo};

/// Postgres-backed ledger.
#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TradeLedger for PgLedger {
    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_wallets(&self, active_only: bool) -> anyhow::Result<Vec<LeaderWallet>> {
        wallet_repo::list_wallets(&self.pool, active_only).await
    }

    async fn find_wallet_by_address(&self, address: &str) -> anyhow::Result<Option<LeaderWallet>> {
        wallet_repo::get_wallet_by_address(&self.pool, address).await
    }

    async fn insert_wallet(
        &self,
        address: &str,
        nickname: Option<&str>,
    ) -> anyhow::Result<Option<LeaderWallet>> {
        wallet_repo::insert_wallet(&self.pool, address, nickname).await
    }

    async fn set_wallet_active(
        &self,
        id: Uuid,
        is_active: bool,
    ) -> anyhow::Result<Option<LeaderWallet>> {
        wallet_repo::set_active(&self.pool, id, is_active).await
    }

    async fn set_last_monitored(&self, id: Uuid, at: DateTime<Utc>) -> anyhow::Result<()> {
        wallet_repo::set_last_monitored(&self.pool, id, at).await
    }

    async fn insert_leader_trade(
        &self,
        trade: NewLeaderTrade,
    ) -> anyhow::Result<Option<LeaderTrade>> {
        trade_repo::insert_trade(&self.pool, &trade).await
    }

    async fn list_leader_trades(&self, limit: i64) -> anyhow::Result<Vec<LeaderTrade>> {
        trade_repo::get_recent_trades(&self.pool, limit).await
    }

    async fn record_execution(&self, trade: NewFollowerTrade) -> anyhow::Result<ExecutionRecord> {
        let mut tx = self.pool.begin().await?;

        let (change, pnl) = if trade.status.is_filled() {
            // A YES fill may create the row, so insert it first to have
            // something to lock. NO fills never create a row.
            if trade.side == Side::Yes {
                position_repo::ensure_row(&mut tx, &trade.market_id, &trade.outcome_id, trade.executed_at)
                    .await?;
            }
            let existing =
                position_repo::lock_position(&mut tx, &trade.market_id, &trade.outcome_id).await?;

            let outcome = apply_fill(
                existing.as_ref(),
                &trade.market_id,
                &trade.outcome_id,
                trade.side,
                trade.size,
                trade.price,
                trade.executed_at,
            );

            match &outcome.change {
                PositionChange::Upserted(position) => {
                    position_repo::update_position(&mut tx, position).await?;
                }
                PositionChange::Closed { market_id, outcome_id } => {
                    position_repo::delete_position(&mut tx, market_id, outcome_id).await?;
                }
                PositionChange::Unchanged => {}
            }
            (outcome.change, outcome.realized_pnl)
        } else {
            (PositionChange::Unchanged, Decimal::ZERO)
        };

        let stored = follower_repo::insert_trade(&mut tx, &trade, pnl).await?;
        tx.commit().await?;

        Ok(ExecutionRecord {
            trade: stored,
            position: change,
        })
    }

    async fn list_follower_trades(&self, limit: i64) -> anyhow::Result<Vec<FollowerTrade>> {
        follower_repo::get_recent_trades(&self.pool, limit).await
    }

    async fn count_follower_trades_since(&self, since: DateTime<Utc>) -> anyhow::Result<i64> {
        follower_repo::count_since(&self.pool, since).await
    }

    async fn list_positions(&self) -> anyhow::Result<Vec<Position>> {
        position_repo::get_open_positions(&self.pool).await
    }

    async fn risk_snapshot(
        &self,
        market_id: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<LedgerSnapshot> {
        let open_markets = position_repo::count_open_markets(&self.pool).await?;
        let market_exposure = position_repo::market_exposure(&self.pool, market_id).await?;
        let daily_pnl = follower_repo::pnl_since(&self.pool, day_start(now)).await?;
        let trades_last_hour =
            follower_repo::count_since(&self.pool, now - Duration::hours(1)).await?;

        Ok(LedgerSnapshot {
            open_markets,
            market_exposure,
            daily_pnl,
            trades_last_hour,
        })
    }

    async fn trading_stats(&self) -> anyhow::Result<TradingStats> {
        let (total, profitable, profit) = follower_repo::profit_summary(&self.pool).await?;
        let active_wallets = wallet_repo::count_active(&self.pool).await?;
        Ok(TradingStats::new(total, profitable, profit, active_wallets))
    }

    async fn load_settings(&self) -> anyhow::Result<Settings> {
        settings_repo::load_settings(&self.pool).await
    }

    async fn save_settings(&self, settings: &Settings) -> anyhow::Result<Settings> {
        settings_repo::save_settings(&self.pool, settings).await
    }

    async fn record_event(&self, event: NewSystemEvent) -> anyhow::Result<SystemEvent> {
        event_repo::insert_event(&self.pool, &event).await
    }

    async fn list_events(&self, limit: i64) -> anyhow::Result<Vec<SystemEvent>> {
        event_repo::get_recent_events(&self.pool, limit).await
    }

    async fn reset_analytics(&self) -> anyhow::Result<AnalyticsReset> {
        let mut tx = self.pool.begin().await?;

        let follower_trades = sqlx::query("DELETE FROM follower_trades")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let leader_trades = sqlx::query("DELETE FROM leader_trades")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let positions = sqlx::query("DELETE FROM positions")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let wallets_rewound = sqlx::query(
            "UPDATE leader_wallets SET last_monitored = NULL WHERE last_monitored IS NOT NULL",
        )
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        Ok(AnalyticsReset {
            follower_trades,
            leader_trades,
            positions,
            wallets_rewound,
        })
    }
}
