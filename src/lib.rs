pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod execution;
pub mod ledger;
pub mod metrics;
pub mod models;
pub mod polymarket;
pub mod ports;
pub mod services;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::execution::copy_engine::CopyEngine;
use crate::execution::order_executor::OrderExecutor;
use crate::execution::risk_manager::RiskManager;
use crate::execution::strategy::StrategyEngine;
use crate::ledger::TradeLedger;
use crate::ports::{MarketDataPort, TradingPort};
use crate::services::mode_controller::ModeController;
use crate::services::wallet_monitor::WalletMonitor;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<dyn TradeLedger>,
    pub controller: Arc<ModeController>,
    pub config: AppConfig,
    /// `None` when no Prometheus recorder is installed.
    pub metrics_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
}

/// Wire strategy, risk, executor, monitor and controller over one ledger.
pub fn build_controller(
    config: &AppConfig,
    ledger: Arc<dyn TradeLedger>,
    market_data: Arc<dyn MarketDataPort>,
    trading: Option<Arc<dyn TradingPort>>,
) -> Arc<ModeController> {
    let engine = Arc::new(CopyEngine::new(
        ledger.clone(),
        StrategyEngine::new(market_data.clone(), config.market_cache_ttl()),
        RiskManager::new(ledger.clone()),
        OrderExecutor::new(ledger.clone(), trading),
    ));

    let monitor = Arc::new(WalletMonitor::new(
        ledger.clone(),
        market_data,
        engine,
        config.monitor_config(),
    ));

    Arc::new(ModeController::new(ledger, monitor))
}
