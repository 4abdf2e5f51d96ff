use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::{watch, RwLock};

use copytrader::execution::copy_engine::CopyEngine;
use copytrader::execution::order_executor::OrderExecutor;
use copytrader::execution::risk_manager::RiskManager;
use copytrader::execution::strategy::StrategyEngine;
use copytrader::ledger::{
    AnalyticsReset, ExecutionRecord, LedgerSnapshot, MemoryLedger, TradeLedger, TradingStats,
};
use copytrader::models::{
    FetchedTrade, FollowerTrade, LeaderTrade, LeaderWallet, MarketInfo, NewFollowerTrade,
    NewLeaderTrade, NewSystemEvent, Position, Settings, Side, SystemEvent, TradingMode,
    TradingStatus,
};
use uuid::Uuid;
use copytrader::ports::{MarketDataPort, OrderRequest, OrderResult, TradingPort};
use copytrader::services::wallet_monitor::{MonitorConfig, MonitorContext, WalletMonitor};

#[allow(dead_code)]
pub const WALLET_A: &str = "0x1111111111111111111111111111111111111111";
#[allow(dead_code)]
pub const WALLET_B: &str = "0x2222222222222222222222222222222222222222";
#[allow(dead_code)]
pub const MARKET: &str = "0xmarket_test_001";

// ---------------------------------------------------------------------------
// Fake ports
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeMarketData {
    trades: Mutex<HashMap<String, Vec<FetchedTrade>>>,
    markets: Mutex<HashMap<String, MarketInfo>>,
    failing_wallets: Mutex<HashSet<String>>,
}

#[allow(dead_code)]
impl FakeMarketData {
    pub fn push_trade(&self, wallet: &str, trade: FetchedTrade) {
        self.trades
            .lock()
            .unwrap()
            .entry(wallet.to_string())
            .or_default()
            .push(trade);
    }

    pub fn set_market(&self, market_id: &str, info: MarketInfo) {
        self.markets.lock().unwrap().insert(market_id.to_string(), info);
    }

    pub fn fail_wallet(&self, wallet: &str) {
        self.failing_wallets.lock().unwrap().insert(wallet.to_string());
    }
}

#[async_trait]
impl MarketDataPort for FakeMarketData {
    async fn trades_for_wallet(
        &self,
        address: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<FetchedTrade>> {
        if self.failing_wallets.lock().unwrap().contains(address) {
            anyhow::bail!("data api unavailable for {address}");
        }
        let trades = self.trades.lock().unwrap();
        Ok(trades
            .get(address)
            .map(|list| {
                list.iter()
                    .filter(|t| t.executed_at >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn market_info(&self, market_id: &str) -> anyhow::Result<MarketInfo> {
        self.markets
            .lock()
            .unwrap()
            .get(market_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("market {market_id} not found"))
    }
}

#[allow(dead_code)]
pub enum Venue {
    Fill(Decimal),
    Reject(&'static str),
    Error(&'static str),
}

pub struct FakeTradingPort {
    venue: Venue,
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeTradingPort {
    pub fn new(venue: Venue) -> Self {
        Self {
            venue,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TradingPort for FakeTradingPort {
    async fn place_order(&self, _order: &OrderRequest) -> anyhow::Result<OrderResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.venue {
            Venue::Fill(price) => Ok(OrderResult {
                success: true,
                order_id: Some("order-1".into()),
                error: None,
                fill_price: Some(*price),
            }),
            Venue::Reject(msg) => Ok(OrderResult::rejected(*msg)),
            Venue::Error(msg) => Err(anyhow::anyhow!(*msg)),
        }
    }
}

// ---------------------------------------------------------------------------
// Fault-injecting ledger
// ---------------------------------------------------------------------------

/// [`MemoryLedger`] with switchable failures.
#[allow(dead_code)]
#[derive(Default)]
pub struct FlakyLedger {
    pub inner: MemoryLedger,
    pub fail_executions: AtomicBool,
    pub fail_settings_saves: AtomicBool,
    /// Address lookups miss, as if another request had not committed yet.
    pub hide_wallets: AtomicBool,
}

#[async_trait]
impl TradeLedger for FlakyLedger {
    async fn ping(&self) -> anyhow::Result<()> {
        self.inner.ping().await
    }

    async fn list_wallets(&self, active_only: bool) -> anyhow::Result<Vec<LeaderWallet>> {
        self.inner.list_wallets(active_only).await
    }

    async fn find_wallet_by_address(&self, address: &str) -> anyhow::Result<Option<LeaderWallet>> {
        if self.hide_wallets.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_wallet_by_address(address).await
    }

    async fn insert_wallet(
        &self,
        address: &str,
        nickname: Option<&str>,
    ) -> anyhow::Result<Option<LeaderWallet>> {
        self.inner.insert_wallet(address, nickname).await
    }

    async fn set_wallet_active(
        &self,
        id: Uuid,
        is_active: bool,
    ) -> anyhow::Result<Option<LeaderWallet>> {
        self.inner.set_wallet_active(id, is_active).await
    }

    async fn set_last_monitored(&self, id: Uuid, at: DateTime<Utc>) -> anyhow::Result<()> {
        self.inner.set_last_monitored(id, at).await
    }

    async fn insert_leader_trade(
        &self,
        trade: NewLeaderTrade,
    ) -> anyhow::Result<Option<LeaderTrade>> {
        self.inner.insert_leader_trade(trade).await
    }

    async fn list_leader_trades(&self, limit: i64) -> anyhow::Result<Vec<LeaderTrade>> {
        self.inner.list_leader_trades(limit).await
    }

    async fn record_execution(&self, trade: NewFollowerTrade) -> anyhow::Result<ExecutionRecord> {
        if self.fail_executions.load(Ordering::SeqCst) {
            anyhow::bail!("connection reset while recording execution");
        }
        self.inner.record_execution(trade).await
    }

    async fn list_follower_trades(&self, limit: i64) -> anyhow::Result<Vec<FollowerTrade>> {
        self.inner.list_follower_trades(limit).await
    }

    async fn count_follower_trades_since(&self, since: DateTime<Utc>) -> anyhow::Result<i64> {
        self.inner.count_follower_trades_since(since).await
    }

    async fn list_positions(&self) -> anyhow::Result<Vec<Position>> {
        self.inner.list_positions().await
    }

    async fn risk_snapshot(
        &self,
        market_id: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<LedgerSnapshot> {
        self.inner.risk_snapshot(market_id, now).await
    }

    async fn trading_stats(&self) -> anyhow::Result<TradingStats> {
        self.inner.trading_stats().await
    }

    async fn load_settings(&self) -> anyhow::Result<Settings> {
        self.inner.load_settings().await
    }

    async fn save_settings(&self, settings: &Settings) -> anyhow::Result<Settings> {
        if self.fail_settings_saves.load(Ordering::SeqCst) {
            anyhow::bail!("settings table locked");
        }
        self.inner.save_settings(settings).await
    }

    async fn record_event(&self, event: NewSystemEvent) -> anyhow::Result<SystemEvent> {
        self.inner.record_event(event).await
    }

    async fn list_events(&self, limit: i64) -> anyhow::Result<Vec<SystemEvent>> {
        self.inner.list_events(limit).await
    }

    async fn reset_analytics(&self) -> anyhow::Result<AnalyticsReset> {
        self.inner.reset_analytics().await
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

#[allow(dead_code)]
pub fn open_market() -> MarketInfo {
    MarketInfo {
        volume: Decimal::from(50_000),
        resolution_time: Some(Utc::now() + chrono::Duration::days(5)),
        is_active: true,
    }
}

#[allow(dead_code)]
pub fn fetched(external_id: &str, side: Side, size: i64, price: Decimal) -> FetchedTrade {
    FetchedTrade {
        external_trade_id: external_id.to_string(),
        market_id: MARKET.to_string(),
        outcome_id: "outcome_yes".to_string(),
        side,
        size: Decimal::from(size),
        price,
        executed_at: Utc::now() - chrono::Duration::seconds(10),
        category: Some("politics".into()),
    }
}

/// Monitor and engine over a [`MemoryLedger`] with a status signal the test
/// drives directly.
#[allow(dead_code)]
pub struct Harness {
    pub ledger: Arc<MemoryLedger>,
    pub market: Arc<FakeMarketData>,
    pub engine: Arc<CopyEngine>,
    pub monitor: Arc<WalletMonitor>,
    pub status_tx: watch::Sender<TradingStatus>,
    pub ctx: MonitorContext,
}

#[allow(dead_code)]
impl Harness {
    pub fn new(trading: Option<Arc<dyn TradingPort>>) -> Self {
        let ledger = Arc::new(MemoryLedger::new());
        let market = Arc::new(FakeMarketData::default());
        market.set_market(MARKET, open_market());

        let dyn_ledger: Arc<dyn TradeLedger> = ledger.clone();
        let dyn_market: Arc<dyn MarketDataPort> = market.clone();

        let engine = Arc::new(CopyEngine::new(
            dyn_ledger.clone(),
            StrategyEngine::new(dyn_market.clone(), Duration::from_secs(60)),
            RiskManager::new(dyn_ledger.clone()),
            OrderExecutor::new(dyn_ledger.clone(), trading),
        ));
        let monitor = Arc::new(WalletMonitor::new(
            dyn_ledger,
            dyn_market,
            engine.clone(),
            MonitorConfig::default(),
        ));

        let (status_tx, status_rx) = watch::channel(TradingStatus::Running);
        let ctx = MonitorContext::new(status_rx, Arc::new(RwLock::new(())));

        Self {
            ledger,
            market,
            engine,
            monitor,
            status_tx,
            ctx,
        }
    }

    /// Persist RUNNING settings after applying `tweak`.
    pub async fn running(&self, tweak: impl FnOnce(&mut Settings)) -> Settings {
        let mut settings = self.ledger.load_settings().await.unwrap();
        settings.global_trading_status = TradingStatus::Running;
        tweak(&mut settings);
        self.ledger.save_settings(&settings).await.unwrap()
    }

    pub async fn live(&self) -> Settings {
        self.running(|s| {
            s.global_trading_mode = TradingMode::Live;
            s.dry_run_enabled = false;
        })
        .await
    }

    pub async fn track(&self, address: &str) -> LeaderWallet {
        self.ledger.insert_wallet(address, None).await.unwrap().unwrap()
    }

    /// One monitor cycle, then wait for every spawned pipeline.
    pub async fn cycle(&self) -> copytrader::services::wallet_monitor::CycleReport {
        let report = self.monitor.run_cycle(&self.ctx).await.unwrap();
        self.ctx.wait_idle().await;
        report
    }

    pub async fn event_types(&self) -> Vec<String> {
        self.ledger
            .list_events(100)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.event_type)
            .collect()
    }
}
