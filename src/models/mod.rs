pub mod event;
pub mod market;
pub mod order;
pub mod position;
pub mod settings;
pub mod trade;
pub mod wallet;

pub use event::{EventLevel, NewSystemEvent, SystemEvent};
pub use market::{FetchedTrade, MarketInfo};
pub use order::MirrorOrder;
pub use position::{apply_fill, FillOutcome, Position, PositionChange};
pub use settings::{Settings, SettingsError, SettingsUpdate};
pub use trade::{FollowerTrade, FollowerTradeStatus, LeaderTrade, NewFollowerTrade, NewLeaderTrade};
pub use wallet::{canonical_address, LeaderWallet, WalletError};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when a stored or submitted enum label is not recognised.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// YES increases exposure to an outcome, NO reduces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Yes,
    No,
}

impl Side {
    /// Accepts ledger labels (YES/NO) as well as venue labels (BUY/SELL).
    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "YES" | "BUY" | "0" => Some(Side::Yes),
            "NO" | "SELL" | "1" => Some(Side::No),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Yes => "YES",
            Side::No => "NO",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Side::from_api_str(s).ok_or_else(|| ParseEnumError {
            kind: "side",
            value: s.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Trading mode / status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradingMode {
    Test,
    Live,
}

impl TradingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradingMode::Test => "TEST",
            TradingMode::Live => "LIVE",
        }
    }
}

impl fmt::Display for TradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradingMode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TEST" => Ok(TradingMode::Test),
            "LIVE" => Ok(TradingMode::Live),
            _ => Err(ParseEnumError {
                kind: "trading mode",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradingStatus {
    Running,
    Paused,
    Stopped,
}

impl TradingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradingStatus::Running => "RUNNING",
            TradingStatus::Paused => "PAUSED",
            TradingStatus::Stopped => "STOPPED",
        }
    }
}

impl fmt::Display for TradingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradingStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "RUNNING" => Ok(TradingStatus::Running),
            "PAUSED" => Ok(TradingStatus::Paused),
            "STOPPED" => Ok(TradingStatus::Stopped),
            _ => Err(ParseEnumError {
                kind: "trading status",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_accepts_venue_labels() {
        assert_eq!(Side::from_api_str("buy"), Some(Side::Yes));
        assert_eq!(Side::from_api_str("SELL"), Some(Side::No));
        assert_eq!(Side::from_api_str("yes"), Some(Side::Yes));
        assert_eq!(Side::from_api_str("maybe"), None);
    }

    #[test]
    fn status_round_trips_through_labels() {
        for status in [TradingStatus::Running, TradingStatus::Paused, TradingStatus::Stopped] {
            assert_eq!(status.as_str().parse::<TradingStatus>().unwrap(), status);
        }
        assert!("halted".parse::<TradingStatus>().is_err());
    }
}
