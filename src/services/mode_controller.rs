use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::ledger::{AnalyticsReset, TradeLedger};
use crate::models::event::event_type;
use crate::models::{NewSystemEvent, Settings, SettingsError, SettingsUpdate, TradingMode, TradingStatus};

use super::wallet_monitor::{MonitorContext, WalletMonitor};

/// Read side of the controller's status signal.
#[derive(Clone)]
pub struct TradingGate {
    rx: watch::Receiver<TradingStatus>,
}

impl TradingGate {
    pub fn new(rx: watch::Receiver<TradingStatus>) -> Self {
        Self { rx }
    }

    pub fn status(&self) -> TradingStatus {
        *self.rx.borrow()
    }
}

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("cannot go from {from} to {to}")]
    InvalidTransition { from: TradingStatus, to: TradingStatus },

    #[error("already in {0} mode")]
    ModeUnchanged(TradingMode),

    #[error("bot must be STOPPED, currently {0}")]
    NotStopped(TradingStatus),

    #[error(transparent)]
    InvalidSettings(#[from] SettingsError),

    #[error(transparent)]
    Ledger(#[from] anyhow::Error),
}

/// Owns the RUNNING / PAUSED / STOPPED lifecycle and the TEST / LIVE mode.
///
/// Every operation takes the control lock, so transitions never interleave.
/// The persisted settings row is the source of truth; the watch channel
/// mirrors its status for the monitor and pipeline tasks.
pub struct ModeController {
    ledger: Arc<dyn TradeLedger>,
    monitor: Arc<WalletMonitor>,
    status_tx: watch::Sender<TradingStatus>,
    inflight: Arc<RwLock<()>>,
    monitor_task: Mutex<Option<JoinHandle<()>>>,
}

impl ModeController {
    pub fn new(ledger: Arc<dyn TradeLedger>, monitor: Arc<WalletMonitor>) -> Self {
        let (status_tx, _) = watch::channel(TradingStatus::Stopped);
        Self {
            ledger,
            monitor,
            status_tx,
            inflight: Arc::new(RwLock::new(())),
            monitor_task: Mutex::new(None),
        }
    }

    pub fn gate(&self) -> TradingGate {
        TradingGate::new(self.status_tx.subscribe())
    }

    /// Context for driving the monitor by hand (tests, one-off scans).
    pub fn monitor_context(&self) -> MonitorContext {
        MonitorContext::new(self.status_tx.subscribe(), self.inflight.clone())
    }

    pub fn status(&self) -> TradingStatus {
        *self.status_tx.borrow()
    }

    pub async fn monitor_alive(&self) -> bool {
        self.monitor_task
            .lock()
            .await
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    pub async fn start(&self) -> Result<Settings, ControlError> {
        let mut task = self.monitor_task.lock().await;
        let settings = self.ledger.load_settings().await?;
        let from = settings.global_trading_status;
        if from == TradingStatus::Running {
            return Err(ControlError::InvalidTransition {
                from,
                to: TradingStatus::Running,
            });
        }

        let settings = self.persist_status(settings, TradingStatus::Running).await?;
        self.status_tx.send_replace(TradingStatus::Running);
        self.ensure_monitor(&mut task);

        tracing::info!(
            from = %from,
            mode = %settings.global_trading_mode,
            dry_run = settings.dry_run_enabled,
            "Bot started"
        );
        self.event(
            NewSystemEvent::info(event_type::BOT_STARTED, format!("Bot started from {from}"))
                .with_metadata(json!({
                    "from": from,
                    "mode": settings.global_trading_mode,
                    "dry_run": settings.dry_run_enabled,
                })),
        )
        .await?;

        Ok(settings)
    }

    pub async fn pause(&self) -> Result<Settings, ControlError> {
        let _task = self.monitor_task.lock().await;
        let settings = self.ledger.load_settings().await?;
        let from = settings.global_trading_status;
        if from != TradingStatus::Running {
            return Err(ControlError::InvalidTransition {
                from,
                to: TradingStatus::Paused,
            });
        }

        let settings = self.persist_status(settings, TradingStatus::Paused).await?;
        self.status_tx.send_replace(TradingStatus::Paused);

        tracing::info!("Bot paused");
        self.event(NewSystemEvent::info(event_type::BOT_PAUSED, "Bot paused"))
            .await?;

        Ok(settings)
    }

    /// Stop and wait until the monitor and every in-flight pipeline finish.
    pub async fn stop(&self) -> Result<Settings, ControlError> {
        let mut task = self.monitor_task.lock().await;
        let settings = self.ledger.load_settings().await?;
        if settings.global_trading_status == TradingStatus::Stopped {
            return Err(ControlError::InvalidTransition {
                from: TradingStatus::Stopped,
                to: TradingStatus::Stopped,
            });
        }

        self.stop_locked(&mut task, settings, "operator request").await
    }

    /// Switch TEST ↔ LIVE. A running or paused bot is stopped first.
    pub async fn switch_mode(
        &self,
        target: TradingMode,
        reset_analytics: bool,
    ) -> Result<Settings, ControlError> {
        let mut task = self.monitor_task.lock().await;
        let mut settings = self.ledger.load_settings().await?;
        let from = settings.global_trading_mode;
        if from == target {
            return Err(ControlError::ModeUnchanged(target));
        }

        if settings.global_trading_status != TradingStatus::Stopped {
            tracing::warn!(
                status = %settings.global_trading_status,
                from = %from,
                to = %target,
                "Forcing stop before mode switch"
            );
            settings = self.stop_locked(&mut task, settings, "mode switch").await?;
        }

        let reset = if reset_analytics {
            Some(self.reset_locked().await?)
        } else {
            None
        };

        let now = Utc::now();
        settings.global_trading_mode = target;
        settings.last_mode_switch = Some(now);
        match target {
            TradingMode::Test => {
                settings.test_mode_started = Some(now);
                // TEST always re-arms dry run.
                settings.dry_run_enabled = true;
            }
            TradingMode::Live => settings.live_mode_started = Some(now),
        }
        let settings = self.ledger.save_settings(&settings).await?;

        tracing::warn!(from = %from, to = %target, reset = reset_analytics, "Trading mode switched");
        self.event(
            NewSystemEvent::warn(event_type::MODE_SWITCHED, format!("Mode switched {from} → {target}"))
                .with_metadata(json!({
                    "from": from,
                    "to": target,
                    "analytics_reset": reset,
                    "dry_run_enabled": settings.dry_run_enabled,
                })),
        )
        .await?;

        Ok(settings)
    }

    /// Clear trade history and positions. Only allowed while STOPPED.
    pub async fn reset_analytics(&self) -> Result<AnalyticsReset, ControlError> {
        let _task = self.monitor_task.lock().await;
        let settings = self.ledger.load_settings().await?;
        if settings.global_trading_status != TradingStatus::Stopped {
            return Err(ControlError::NotStopped(settings.global_trading_status));
        }
        self.reset_locked().await
    }

    /// Apply an operator settings update. Status and mode are not part of
    /// [`SettingsUpdate`] and stay as stored.
    pub async fn update_settings(&self, update: SettingsUpdate) -> Result<Settings, ControlError> {
        update.validate()?;

        let _task = self.monitor_task.lock().await;
        let mut settings = self.ledger.load_settings().await?;
        update.apply_to(&mut settings);
        let settings = self.ledger.save_settings(&settings).await?;

        tracing::info!(?update, "Settings updated");
        self.event(
            NewSystemEvent::info(event_type::SETTINGS_UPDATED, "Settings updated")
                .with_metadata(serde_json::to_value(&update).map_err(anyhow::Error::from)?),
        )
        .await?;

        Ok(settings)
    }

    /// Resume the persisted status after a restart.
    pub async fn restore(&self) -> Result<Settings, ControlError> {
        let mut task = self.monitor_task.lock().await;
        let settings = self.ledger.load_settings().await?;
        let status = settings.global_trading_status;

        self.status_tx.send_replace(status);
        if status != TradingStatus::Stopped {
            self.ensure_monitor(&mut task);
        }

        tracing::info!(
            status = %status,
            mode = %settings.global_trading_mode,
            dry_run = settings.dry_run_enabled,
            "Trading state restored"
        );
        Ok(settings)
    }

    /// Halt and drain for process exit. The persisted status is left alone
    /// so the next boot resumes where this one stopped.
    pub async fn shutdown(&self) {
        let mut task = self.monitor_task.lock().await;
        self.status_tx.send_replace(TradingStatus::Stopped);
        self.join_monitor(&mut task).await;
        drop(self.inflight.write().await);
        tracing::info!("Controller shut down, pipelines drained");
    }

    // ---- internals (control lock held) ----

    async fn stop_locked(
        &self,
        task: &mut Option<JoinHandle<()>>,
        settings: Settings,
        reason: &str,
    ) -> Result<Settings, ControlError> {
        let from = settings.global_trading_status;

        // Stored status first, so a failed save leaves signal and row agreeing.
        let settings = self.persist_status(settings, TradingStatus::Stopped).await?;
        self.status_tx.send_replace(TradingStatus::Stopped);

        self.join_monitor(task).await;
        drop(self.inflight.write().await);

        tracing::info!(from = %from, reason, "Bot stopped and drained");
        self.event(
            NewSystemEvent::info(event_type::BOT_STOPPED, format!("Bot stopped ({reason})"))
                .with_metadata(json!({ "from": from, "reason": reason })),
        )
        .await?;

        Ok(settings)
    }

    async fn reset_locked(&self) -> Result<AnalyticsReset, ControlError> {
        let counts = self.ledger.reset_analytics().await?;

        tracing::warn!(
            follower_trades = counts.follower_trades,
            leader_trades = counts.leader_trades,
            positions = counts.positions,
            "Analytics reset"
        );
        self.event(
            NewSystemEvent::warn(event_type::ANALYTICS_RESET, "Trade history and positions cleared")
                .with_metadata(serde_json::to_value(&counts).map_err(anyhow::Error::from)?),
        )
        .await?;

        Ok(counts)
    }

    async fn persist_status(
        &self,
        mut settings: Settings,
        status: TradingStatus,
    ) -> anyhow::Result<Settings> {
        settings.global_trading_status = status;
        self.ledger.save_settings(&settings).await
    }

    fn ensure_monitor(&self, task: &mut Option<JoinHandle<()>>) {
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }
        let ctx = self.monitor_context();
        *task = Some(tokio::spawn(self.monitor.clone().run(ctx)));
    }

    async fn join_monitor(&self, task: &mut Option<JoinHandle<()>>) {
        if let Some(handle) = task.take() {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Wallet monitor task ended abnormally");
            }
        }
    }

    async fn event(&self, event: NewSystemEvent) -> anyhow::Result<()> {
        self.ledger.record_event(event).await?;
        Ok(())
    }
}
