use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{
    apply_fill, FollowerTrade, LeaderTrade, LeaderWallet, NewFollowerTrade, NewLeaderTrade,
    NewSystemEvent, Position, PositionChange, Settings, SystemEvent,
};

use super::{
    day_start, AnalyticsReset, ExecutionRecord, LedgerSnapshot, TradeLedger, TradingStats,
};

#[derive(Default)]
struct State {
    wallets: Vec<LeaderWallet>,
    leader_trades: Vec<LeaderTrade>,
    external_ids: HashSet<String>,
    follower_trades: Vec<FollowerTrade>,
    positions: HashMap<(String, String), Position>,
    settings: Option<Settings>,
    events: Vec<SystemEvent>,
}

/// In-process ledger. A single mutex guards all tables, so every operation is
/// atomic with respect to every other.
#[derive(Default)]
pub struct MemoryLedger {
    state: Mutex<State>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest-first copy of the last `limit` items.
fn newest<T: Clone>(items: &[T], limit: i64) -> Vec<T> {
    let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
    items.iter().rev().take(limit).cloned().collect()
}

fn trades_since(trades: &[FollowerTrade], since: DateTime<Utc>) -> i64 {
    trades.iter().filter(|t| t.executed_at >= since).count() as i64
}

#[async_trait]
impl TradeLedger for MemoryLedger {
    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn list_wallets(&self, active_only: bool) -> anyhow::Result<Vec<LeaderWallet>> {
        let state = self.state.lock().await;
        Ok(state
            .wallets
            .iter()
            .filter(|w| !active_only || w.is_active)
            .cloned()
            .collect())
    }

    async fn find_wallet_by_address(&self, address: &str) -> anyhow::Result<Option<LeaderWallet>> {
        let state = self.state.lock().await;
        Ok(state.wallets.iter().find(|w| w.address == address).cloned())
    }

    async fn insert_wallet(
        &self,
        address: &str,
        nickname: Option<&str>,
    ) -> anyhow::Result<Option<LeaderWallet>> {
        let mut state = self.state.lock().await;
        if state.wallets.iter().any(|w| w.address == address) {
            return Ok(None);
        }

        let wallet = LeaderWallet {
            id: Uuid::new_v4(),
            address: address.to_string(),
            nickname: nickname.map(str::to_string),
            is_active: true,
            last_monitored: None,
            created_at: Utc::now(),
        };
        state.wallets.push(wallet.clone());
        Ok(Some(wallet))
    }

    async fn set_wallet_active(
        &self,
        id: Uuid,
        is_active: bool,
    ) -> anyhow::Result<Option<LeaderWallet>> {
        let mut state = self.state.lock().await;
        Ok(state.wallets.iter_mut().find(|w| w.id == id).map(|w| {
            w.is_active = is_active;
            w.clone()
        }))
    }

    async fn set_last_monitored(&self, id: Uuid, at: DateTime<Utc>) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        if let Some(wallet) = state.wallets.iter_mut().find(|w| w.id == id) {
            wallet.last_monitored = Some(at);
        }
        Ok(())
    }

    async fn insert_leader_trade(
        &self,
        trade: NewLeaderTrade,
    ) -> anyhow::Result<Option<LeaderTrade>> {
        let mut state = self.state.lock().await;
        if !state.external_ids.insert(trade.external_trade_id.clone()) {
            return Ok(None);
        }

        let stored = trade.into_trade(Uuid::new_v4(), Utc::now());
        state.leader_trades.push(stored.clone());
        Ok(Some(stored))
    }

    async fn list_leader_trades(&self, limit: i64) -> anyhow::Result<Vec<LeaderTrade>> {
        let state = self.state.lock().await;
        Ok(newest(&state.leader_trades, limit))
    }

    async fn record_execution(&self, trade: NewFollowerTrade) -> anyhow::Result<ExecutionRecord> {
        let mut state = self.state.lock().await;
        let key = (trade.market_id.clone(), trade.outcome_id.clone());

        let (change, pnl) = if trade.status.is_filled() {
            let outcome = apply_fill(
                state.positions.get(&key),
                &trade.market_id,
                &trade.outcome_id,
                trade.side,
                trade.size,
                trade.price,
                trade.executed_at,
            );
            (outcome.change, outcome.realized_pnl)
        } else {
            (PositionChange::Unchanged, Decimal::ZERO)
        };

        match &change {
            PositionChange::Upserted(position) => {
                state.positions.insert(key, position.clone());
            }
            PositionChange::Closed { .. } => {
                state.positions.remove(&key);
            }
            PositionChange::Unchanged => {}
        }

        let stored = trade.into_trade(Uuid::new_v4(), pnl);
        state.follower_trades.push(stored.clone());

        Ok(ExecutionRecord {
            trade: stored,
            position: change,
        })
    }

    async fn list_follower_trades(&self, limit: i64) -> anyhow::Result<Vec<FollowerTrade>> {
        let state = self.state.lock().await;
        Ok(newest(&state.follower_trades, limit))
    }

    async fn count_follower_trades_since(&self, since: DateTime<Utc>) -> anyhow::Result<i64> {
        let state = self.state.lock().await;
        Ok(trades_since(&state.follower_trades, since))
    }

    async fn list_positions(&self) -> anyhow::Result<Vec<Position>> {
        let state = self.state.lock().await;
        let mut positions: Vec<Position> = state.positions.values().cloned().collect();
        positions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(positions)
    }

    async fn risk_snapshot(
        &self,
        market_id: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<LedgerSnapshot> {
        let state = self.state.lock().await;

        let open_markets = state
            .positions
            .keys()
            .map(|(market, _)| market.as_str())
            .collect::<HashSet<_>>()
            .len() as i64;

        let market_exposure = state
            .positions
            .values()
            .filter(|p| p.market_id == market_id)
            .map(Position::exposure)
            .sum();

        let since_midnight = day_start(now);
        let daily_pnl = state
            .follower_trades
            .iter()
            .filter(|t| t.executed_at >= since_midnight)
            .map(|t| t.pnl)
            .sum();

        Ok(LedgerSnapshot {
            open_markets,
            market_exposure,
            daily_pnl,
            trades_last_hour: trades_since(&state.follower_trades, now - Duration::hours(1)),
        })
    }

    async fn trading_stats(&self) -> anyhow::Result<TradingStats> {
        let state = self.state.lock().await;
        let profitable: Vec<Decimal> = state
            .follower_trades
            .iter()
            .map(|t| t.pnl)
            .filter(|pnl| *pnl > Decimal::ZERO)
            .collect();

        Ok(TradingStats::new(
            state.follower_trades.len() as i64,
            profitable.len() as i64,
            profitable.iter().sum(),
            state.wallets.iter().filter(|w| w.is_active).count() as i64,
        ))
    }

    async fn load_settings(&self) -> anyhow::Result<Settings> {
        let mut state = self.state.lock().await;
        Ok(state.settings.get_or_insert_with(Settings::default).clone())
    }

    async fn save_settings(&self, settings: &Settings) -> anyhow::Result<Settings> {
        let mut state = self.state.lock().await;
        let stored = Settings {
            updated_at: Utc::now(),
            ..settings.clone()
        };
        state.settings = Some(stored.clone());
        Ok(stored)
    }

    async fn record_event(&self, event: NewSystemEvent) -> anyhow::Result<SystemEvent> {
        let mut state = self.state.lock().await;
        let stored = event.into_event(Uuid::new_v4(), Utc::now());
        state.events.push(stored.clone());
        Ok(stored)
    }

    async fn list_events(&self, limit: i64) -> anyhow::Result<Vec<SystemEvent>> {
        let state = self.state.lock().await;
        Ok(newest(&state.events, limit))
    }

    async fn reset_analytics(&self) -> anyhow::Result<AnalyticsReset> {
        let mut state = self.state.lock().await;

        let counts = AnalyticsReset {
            follower_trades: state.follower_trades.len() as u64,
            leader_trades: state.leader_trades.len() as u64,
            positions: state.positions.len() as u64,
            wallets_rewound: state
                .wallets
                .iter()
                .filter(|w| w.last_monitored.is_some())
                .count() as u64,
        };

        state.follower_trades.clear();
        state.leader_trades.clear();
        state.external_ids.clear();
        state.positions.clear();
        for wallet in &mut state.wallets {
            wallet.last_monitored = None;
        }

        Ok(counts)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FollowerTradeStatus, Side};

    fn leader_trade(external_id: &str, wallet_id: Uuid) -> NewLeaderTrade {
        NewLeaderTrade {
            external_trade_id: external_id.into(),
            wallet_id,
            market_id: "m1".into(),
            outcome_id: "o1".into(),
            side: Side::Yes,
            size: Decimal::from(100),
            price: Decimal::new(5, 1),
            executed_at: Utc::now(),
            category: None,
        }
    }

    fn fill(side: Side, size: i64, price: Decimal, status: FollowerTradeStatus) -> NewFollowerTrade {
        NewFollowerTrade {
            leader_trade_id: Uuid::new_v4(),
            market_id: "m1".into(),
            outcome_id: "o1".into(),
            side,
            size: Decimal::from(size),
            price,
            status,
            is_dry_run: true,
            order_id: None,
            error_message: None,
            executed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_external_id_is_ignored() {
        let ledger = MemoryLedger::new();
        let wallet_id = Uuid::new_v4();

        let first = ledger.insert_leader_trade(leader_trade("t-1", wallet_id)).await.unwrap();
        let second = ledger.insert_leader_trade(leader_trade("t-1", wallet_id)).await.unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(ledger.list_leader_trades(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_execution_leaves_positions_alone() {
        let ledger = MemoryLedger::new();
        let record = ledger
            .record_execution(fill(Side::Yes, 10, Decimal::new(5, 1), FollowerTradeStatus::Failed))
            .await
            .unwrap();

        assert_eq!(record.position, PositionChange::Unchanged);
        assert_eq!(record.trade.status, FollowerTradeStatus::Failed);
        assert!(ledger.list_positions().await.unwrap().is_empty());
        assert_eq!(ledger.list_follower_trades(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_reflects_positions_and_pnl() {
        let ledger = MemoryLedger::new();
        ledger
            .record_execution(fill(Side::Yes, 10, Decimal::new(5, 1), FollowerTradeStatus::Simulated))
            .await
            .unwrap();
        ledger
            .record_execution(fill(Side::No, 4, Decimal::new(4, 1), FollowerTradeStatus::Simulated))
            .await
            .unwrap();

        let snapshot = ledger.risk_snapshot("m1", Utc::now()).await.unwrap();
        assert_eq!(snapshot.open_markets, 1);
        assert_eq!(snapshot.market_exposure, Decimal::from(3));
        assert_eq!(snapshot.daily_pnl, Decimal::new(-4, 1));
        assert_eq!(snapshot.trades_last_hour, 2);
    }

    #[tokio::test]
    async fn test_settings_created_lazily_with_defaults() {
        let ledger = MemoryLedger::new();
        let settings = ledger.load_settings().await.unwrap();
        assert_eq!(settings.max_trades_per_hour, 10);
        assert!(settings.dry_run_enabled);
    }

    #[tokio::test]
    async fn test_stats_count_profitable_fills() {
        let ledger = MemoryLedger::new();
        ledger
            .insert_wallet("0x1111111111111111111111111111111111111111", None)
            .await
            .unwrap();
        for (side, size, price) in [
            (Side::Yes, 10, Decimal::new(4, 1)),
            (Side::No, 5, Decimal::new(6, 1)),
            (Side::Yes, 10, Decimal::new(5, 1)),
        ] {
            ledger
                .record_execution(fill(side, size, price, FollowerTradeStatus::Simulated))
                .await
                .unwrap();
        }

        let stats = ledger.trading_stats().await.unwrap();
        assert_eq!(stats.total_trades, 3);
        assert_eq!(stats.profitable_trades, 1);
        // 5 × (0.6 − 0.4)
        assert_eq!(stats.total_profit, Decimal::from(1));
        assert_eq!(stats.win_rate, Decimal::new(333, 1));
        assert_eq!(stats.active_wallets, 1);
    }

    #[tokio::test]
    async fn test_reset_clears_history_and_rewinds_wallets() {
        let ledger = MemoryLedger::new();
        let wallet = ledger
            .insert_wallet("0x1111111111111111111111111111111111111111", None)
            .await
            .unwrap()
            .unwrap();
        ledger.set_last_monitored(wallet.id, Utc::now()).await.unwrap();
        ledger.insert_leader_trade(leader_trade("t-1", wallet.id)).await.unwrap();
        ledger
            .record_execution(fill(Side::Yes, 10, Decimal::new(5, 1), FollowerTradeStatus::Simulated))
            .await
            .unwrap();

        let counts = ledger.reset_analytics().await.unwrap();
        assert_eq!(counts.follower_trades, 1);
        assert_eq!(counts.leader_trades, 1);
        assert_eq!(counts.positions, 1);
        assert_eq!(counts.wallets_rewound, 1);

        let wallets = ledger.list_wallets(false).await.unwrap();
        assert!(wallets[0].last_monitored.is_none());
        // Ingestion starts over: the old external id is accepted again.
        assert!(ledger
            .insert_leader_trade(leader_trade("t-1", wallet.id))
            .await
            .unwrap()
            .is_some());
    }
}
