use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{TradingMode, TradingStatus};

/// Global trading settings. Exactly one row exists in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub global_trading_mode: TradingMode,
    pub global_trading_status: TradingStatus,
    pub dry_run_enabled: bool,
    /// Percentage (0-100] of the leader's size to mirror.
    pub copy_trade_percentage: Decimal,
    /// Maximum USD value of a single mirrored order.
    pub max_trade_amount: Decimal,
    pub min_market_volume: Decimal,
    pub max_days_to_resolution: i64,
    pub max_open_markets: i64,
    pub max_exposure_per_market: Decimal,
    pub daily_loss_limit: Decimal,
    pub max_trades_per_hour: i64,
    pub last_mode_switch: Option<DateTime<Utc>>,
    pub test_mode_started: Option<DateTime<Utc>>,
    pub live_mode_started: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            global_trading_mode: TradingMode::Test,
            global_trading_status: TradingStatus::Stopped,
            dry_run_enabled: true,
            copy_trade_percentage: Decimal::from(20),
            max_trade_amount: Decimal::from(100),
            min_market_volume: Decimal::from(1_000),
            max_days_to_resolution: 30,
            max_open_markets: 10,
            max_exposure_per_market: Decimal::from(500),
            daily_loss_limit: Decimal::from(200),
            max_trades_per_hour: 10,
            last_mode_switch: None,
            test_mode_started: None,
            live_mode_started: None,
            updated_at: Utc::now(),
        }
    }
}

impl Settings {
    /// True when execution must not contact the trading venue.
    pub fn is_simulated(&self) -> bool {
        self.dry_run_enabled || self.global_trading_mode == TradingMode::Test
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SettingsError {
    #[error("no settings fields provided")]
    Empty,

    #[error("{field} must be {rule}")]
    OutOfRange { field: &'static str, rule: &'static str },
}

/// Operator-editable subset of [`Settings`].
///
/// Only the fields listed here can change through a settings update; status
/// and mode go through the mode controller. Unknown JSON keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsUpdate {
    pub dry_run_enabled: Option<bool>,
    pub copy_trade_percentage: Option<Decimal>,
    pub max_trade_amount: Option<Decimal>,
    pub min_market_volume: Option<Decimal>,
    pub max_days_to_resolution: Option<i64>,
    pub max_open_markets: Option<i64>,
    pub max_exposure_per_market: Option<Decimal>,
    pub daily_loss_limit: Option<Decimal>,
    pub max_trades_per_hour: Option<i64>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        *self == SettingsUpdate::default()
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.is_empty() {
            return Err(SettingsError::Empty);
        }

        if let Some(pct) = self.copy_trade_percentage {
            if pct <= Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
                return Err(SettingsError::OutOfRange {
                    field: "copy_trade_percentage",
                    rule: "in (0, 100]",
                });
            }
        }

        let positive_amounts = [
            ("max_trade_amount", self.max_trade_amount),
            ("max_exposure_per_market", self.max_exposure_per_market),
        ];
        for (field, value) in positive_amounts {
            if matches!(value, Some(v) if v <= Decimal::ZERO) {
                return Err(SettingsError::OutOfRange { field, rule: "greater than 0" });
            }
        }

        let non_negative_amounts = [
            ("min_market_volume", self.min_market_volume),
            ("daily_loss_limit", self.daily_loss_limit),
        ];
        for (field, value) in non_negative_amounts {
            if matches!(value, Some(v) if v < Decimal::ZERO) {
                return Err(SettingsError::OutOfRange { field, rule: "zero or greater" });
            }
        }

        if matches!(self.max_days_to_resolution, Some(v) if v < 0) {
            return Err(SettingsError::OutOfRange {
                field: "max_days_to_resolution",
                rule: "zero or greater",
            });
        }

        let positive_counts = [
            ("max_open_markets", self.max_open_markets),
            ("max_trades_per_hour", self.max_trades_per_hour),
        ];
        for (field, value) in positive_counts {
            if matches!(value, Some(v) if v <= 0) {
                return Err(SettingsError::OutOfRange { field, rule: "greater than 0" });
            }
        }

        Ok(())
    }

    /// Copy every provided field onto `settings`.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(v) = self.dry_run_enabled {
            settings.dry_run_enabled = v;
        }
        if let Some(v) = self.copy_trade_percentage {
            settings.copy_trade_percentage = v;
        }
        if let Some(v) = self.max_trade_amount {
            settings.max_trade_amount = v;
        }
        if let Some(v) = self.min_market_volume {
            settings.min_market_volume = v;
        }
        if let Some(v) = self.max_days_to_resolution {
            settings.max_days_to_resolution = v;
        }
        if let Some(v) = self.max_open_markets {
            settings.max_open_markets = v;
        }
        if let Some(v) = self.max_exposure_per_market {
            settings.max_exposure_per_market = v;
        }
        if let Some(v) = self.daily_loss_limit {
            settings.daily_loss_limit = v;
        }
        if let Some(v) = self.max_trades_per_hour {
            settings.max_trades_per_hour = v;
        }
    }
}
