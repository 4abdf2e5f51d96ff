use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::Utc;
use metrics::{counter, gauge, histogram};
use serde_json::json;
use tokio::sync::{watch, OwnedRwLockReadGuard, RwLock};

use crate::execution::copy_engine::{CopyEngine, PipelineOutcome};
use crate::ledger::TradeLedger;
use crate::models::event::event_type;
use crate::models::{LeaderTrade, LeaderWallet, NewLeaderTrade, NewSystemEvent, Settings, TradingStatus};
use crate::ports::MarketDataPort;

use super::mode_controller::TradingGate;

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
    /// How far back to look for a wallet that has never been scanned.
    pub initial_lookback: chrono::Duration,
    /// Re-read this much before `last_monitored` to catch late-indexed trades.
    pub scan_overlap: chrono::Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            initial_lookback: chrono::Duration::hours(1),
            scan_overlap: chrono::Duration::seconds(60),
        }
    }
}

/// Handles shared between the controller, the monitor and pipeline tasks.
#[derive(Clone)]
pub struct MonitorContext {
    status: watch::Receiver<TradingStatus>,
    inflight: Arc<RwLock<()>>,
}

impl MonitorContext {
    pub fn new(status: watch::Receiver<TradingStatus>, inflight: Arc<RwLock<()>>) -> Self {
        Self { status, inflight }
    }

    pub fn gate(&self) -> TradingGate {
        TradingGate::new(self.status.clone())
    }

    /// Resolves once no pipeline task is running.
    pub async fn wait_idle(&self) {
        drop(self.inflight.write().await);
    }

    async fn pipeline_guard(&self) -> OwnedRwLockReadGuard<()> {
        self.inflight.clone().read_owned().await
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub wallets_scanned: usize,
    pub wallet_errors: usize,
    pub trades_ingested: usize,
    pub duplicates: usize,
    /// Cycle skipped because trading was not RUNNING.
    pub idle: bool,
}

/// Polls active leader wallets and feeds new trades to the copy pipeline.
pub struct WalletMonitor {
    ledger: Arc<dyn TradeLedger>,
    market_data: Arc<dyn MarketDataPort>,
    engine: Arc<CopyEngine>,
    config: MonitorConfig,
}

impl WalletMonitor {
    pub fn new(
        ledger: Arc<dyn TradeLedger>,
        market_data: Arc<dyn MarketDataPort>,
        engine: Arc<CopyEngine>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            ledger,
            market_data,
            engine,
            config,
        }
    }

    /// Poll until the status signal reports STOPPED or its sender is gone.
    pub async fn run(self: Arc<Self>, mut ctx: MonitorContext) {
        tracing::info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            "Wallet monitor started"
        );

        loop {
            if *ctx.status.borrow_and_update() == TradingStatus::Stopped {
                break;
            }

            match self.run_cycle(&ctx).await {
                Ok(report) if !report.idle => tracing::info!(
                    wallets = report.wallets_scanned,
                    errors = report.wallet_errors,
                    ingested = report.trades_ingested,
                    duplicates = report.duplicates,
                    "Monitor cycle complete"
                ),
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Monitor cycle failed"),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                changed = ctx.status.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Wallet monitor stopped");
    }

    /// One pass over all active wallets with a single settings snapshot.
    pub async fn run_cycle(&self, ctx: &MonitorContext) -> anyhow::Result<CycleReport> {
        let started = Instant::now();
        let settings = self.ledger.load_settings().await?;

        if settings.global_trading_status != TradingStatus::Running {
            tracing::debug!(status = %settings.global_trading_status, "Trading not running, cycle skipped");
            return Ok(CycleReport {
                idle: true,
                ..Default::default()
            });
        }

        let wallets = self.ledger.list_wallets(true).await?;
        gauge!("active_wallets").set(wallets.len() as f64);

        let gate = ctx.gate();
        let mut report = CycleReport::default();

        for wallet in &wallets {
            let status = gate.status();
            if status != TradingStatus::Running {
                tracing::info!(status = %status, "Trading halted, ending cycle early");
                break;
            }

            match self.scan_wallet(wallet, &settings, ctx).await {
                Ok((ingested, duplicates)) => {
                    report.wallets_scanned += 1;
                    report.trades_ingested += ingested;
                    report.duplicates += duplicates;
                }
                Err(e) => {
                    report.wallet_errors += 1;
                    counter!("wallet_fetch_errors").increment(1);
                    tracing::error!(wallet = %wallet.address, error = %e, "Wallet scan failed");

                    let event = NewSystemEvent::error(
                        event_type::WALLET_FETCH_FAILED,
                        format!("Scan of {} failed: {e:#}", wallet.address),
                    )
                    .with_metadata(json!({ "wallet_id": wallet.id, "address": wallet.address }));
                    if let Err(e) = self.ledger.record_event(event).await {
                        tracing::error!(error = %e, "Failed to record wallet error event");
                    }
                }
            }
        }

        match self.ledger.list_positions().await {
            Ok(positions) => gauge!("open_positions").set(positions.len() as f64),
            Err(e) => tracing::warn!(error = %e, "Position count failed"),
        }

        histogram!("monitor_cycle_seconds").record(started.elapsed().as_secs_f64());
        Ok(report)
    }

    /// Ingest one wallet's new trades. Returns (ingested, duplicates).
    ///
    /// `last_monitored` only advances when every fetched trade was handled.
    pub async fn scan_wallet(
        &self,
        wallet: &LeaderWallet,
        settings: &Settings,
        ctx: &MonitorContext,
    ) -> anyhow::Result<(usize, usize)> {
        let scan_started = Utc::now();
        let since = match wallet.last_monitored {
            Some(last) => last - self.config.scan_overlap,
            None => scan_started - self.config.initial_lookback,
        };

        let fetched = self
            .market_data
            .trades_for_wallet(&wallet.address, since)
            .await
            .context("fetching wallet trades")?;

        let mut ingested = 0;
        let mut duplicates = 0;

        for trade in fetched {
            let new = NewLeaderTrade {
                external_trade_id: trade.external_trade_id,
                wallet_id: wallet.id,
                market_id: trade.market_id,
                outcome_id: trade.outcome_id,
                side: trade.side,
                size: trade.size,
                price: trade.price,
                executed_at: trade.executed_at,
                category: trade.category,
            };

            let Some(stored) = self
                .ledger
                .insert_leader_trade(new)
                .await
                .context("storing leader trade")?
            else {
                duplicates += 1;
                counter!("duplicate_trades").increment(1);
                continue;
            };

            ingested += 1;
            counter!("trades_ingested").increment(1);
            tracing::info!(
                wallet = %wallet.address,
                leader_trade_id = %stored.id,
                market = %stored.market_id,
                side = %stored.side,
                size = %stored.size,
                price = %stored.price,
                "Leader trade ingested"
            );

            self.spawn_pipeline(stored, settings.clone(), ctx).await;
        }

        self.ledger
            .set_last_monitored(wallet.id, scan_started)
            .await
            .context("updating last_monitored")?;

        Ok((ingested, duplicates))
    }

    async fn spawn_pipeline(&self, trade: LeaderTrade, settings: Settings, ctx: &MonitorContext) {
        let guard = ctx.pipeline_guard().await;
        let engine = self.engine.clone();
        let ledger = self.ledger.clone();
        let gate = ctx.gate();

        tokio::spawn(async move {
            let _guard = guard;
            match engine.process(&trade, &settings, &gate).await {
                Ok(PipelineOutcome::Executed(follower)) => tracing::debug!(
                    leader_trade_id = %trade.id,
                    follower_trade_id = %follower.id,
                    "Pipeline executed"
                ),
                Ok(outcome) => tracing::debug!(leader_trade_id = %trade.id, ?outcome, "Pipeline finished"),
                Err(e) => {
                    tracing::error!(leader_trade_id = %trade.id, error = %e, "Copy pipeline failed");
                    let event = NewSystemEvent::error(
                        event_type::PIPELINE_ERROR,
                        format!("Pipeline failed for leader trade {}: {e:#}", trade.id),
                    )
                    .with_metadata(json!({ "leader_trade_id": trade.id }));
                    if let Err(e) = ledger.record_event(event).await {
                        tracing::error!(error = %e, "Failed to record pipeline error event");
                    }
                }
            }
        });
    }
}
