use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::ledger::{LedgerSnapshot, TradeLedger};
use crate::models::{MirrorOrder, Settings};

/// Risk check violation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskViolation {
    #[error("order notional {notional} exceeds max trade amount {max}")]
    TradeTooLarge { notional: Decimal, max: Decimal },

    #[error("too many open markets: {current}/{max}")]
    TooManyMarkets { current: i64, max: i64 },

    #[error("market exposure {exposure} at or above limit {max}")]
    ExposureLimit { exposure: Decimal, max: Decimal },

    #[error("daily loss limit reached: PnL {pnl}, limit -{limit}")]
    DailyLossExceeded { pnl: Decimal, limit: Decimal },

    #[error("hourly trade limit reached: {current}/{max}")]
    RateLimited { current: i64, max: i64 },

    #[error("risk snapshot unavailable: {0}")]
    SnapshotUnavailable(String),
}

impl RiskViolation {
    pub fn code(&self) -> &'static str {
        match self {
            RiskViolation::TradeTooLarge { .. } => "trade_too_large",
            RiskViolation::TooManyMarkets { .. } => "too_many_markets",
            RiskViolation::ExposureLimit { .. } => "exposure_limit",
            RiskViolation::DailyLossExceeded { .. } => "daily_loss",
            RiskViolation::RateLimited { .. } => "rate_limited",
            RiskViolation::SnapshotUnavailable(_) => "snapshot_unavailable",
        }
    }
}

/// Run all 5 risk checks on a mirror order. Returns Ok(()) if all pass.
pub fn authorize(
    order: &MirrorOrder,
    settings: &Settings,
    snapshot: &LedgerSnapshot,
) -> Result<(), RiskViolation> {
    // 1. Worst-case order value
    let notional = order.notional();
    if notional > settings.max_trade_amount {
        return Err(RiskViolation::TradeTooLarge {
            notional,
            max: settings.max_trade_amount,
        });
    }

    // 2. Distinct open markets
    if snapshot.open_markets >= settings.max_open_markets {
        return Err(RiskViolation::TooManyMarkets {
            current: snapshot.open_markets,
            max: settings.max_open_markets,
        });
    }

    // 3. Exposure already held in this market
    if snapshot.market_exposure.abs() >= settings.max_exposure_per_market {
        return Err(RiskViolation::ExposureLimit {
            exposure: snapshot.market_exposure,
            max: settings.max_exposure_per_market,
        });
    }

    // 4. Daily realised loss
    if snapshot.daily_pnl <= -settings.daily_loss_limit {
        return Err(RiskViolation::DailyLossExceeded {
            pnl: snapshot.daily_pnl,
            limit: settings.daily_loss_limit,
        });
    }

    // 5. Trailing-hour trade count
    if snapshot.trades_last_hour >= settings.max_trades_per_hour {
        return Err(RiskViolation::RateLimited {
            current: snapshot.trades_last_hour,
            max: settings.max_trades_per_hour,
        });
    }

    Ok(())
}

/// Like [`authorize`], but rejects when the snapshot could not be read.
pub fn authorize_snapshot(
    order: &MirrorOrder,
    settings: &Settings,
    snapshot: anyhow::Result<LedgerSnapshot>,
) -> Result<LedgerSnapshot, RiskViolation> {
    let snapshot = snapshot.map_err(|e| RiskViolation::SnapshotUnavailable(e.to_string()))?;
    authorize(order, settings, &snapshot)?;
    Ok(snapshot)
}

/// Reads a fresh snapshot from the ledger for each order.
///
/// The snapshot is advisory: two orders reviewed concurrently may both pass
/// against the same counts.
pub struct RiskManager {
    ledger: Arc<dyn TradeLedger>,
}

impl RiskManager {
    pub fn new(ledger: Arc<dyn TradeLedger>) -> Self {
        Self { ledger }
    }

    pub async fn review(
        &self,
        order: &MirrorOrder,
        settings: &Settings,
        now: DateTime<Utc>,
    ) -> Result<LedgerSnapshot, RiskViolation> {
        let snapshot = self.ledger.risk_snapshot(&order.market_id, now).await;
        if let Err(e) = &snapshot {
            tracing::error!(error = %e, market = %order.market_id, "Risk snapshot read failed");
        }
        authorize_snapshot(order, settings, snapshot)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
