use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

impl EventLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventLevel::Info => "INFO",
            EventLevel::Warn => "WARN",
            EventLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventLevel {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "INFO" => Ok(EventLevel::Info),
            "WARN" | "WARNING" => Ok(EventLevel::Warn),
            "ERROR" => Ok(EventLevel::Error),
            _ => Err(ParseEnumError {
                kind: "event level",
                value: s.to_string(),
            }),
        }
    }
}

/// Append-only audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemEvent {
    pub id: Uuid,
    pub event_type: String,
    pub message: String,
    pub level: EventLevel,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSystemEvent {
    pub event_type: &'static str,
    pub message: String,
    pub level: EventLevel,
    pub metadata: serde_json::Value,
}

impl NewSystemEvent {
    pub fn info(event_type: &'static str, message: impl Into<String>) -> Self {
        Self::new(event_type, EventLevel::Info, message)
    }

    pub fn warn(event_type: &'static str, message: impl Into<String>) -> Self {
        Self::new(event_type, EventLevel::Warn, message)
    }

    pub fn error(event_type: &'static str, message: impl Into<String>) -> Self {
        Self::new(event_type, EventLevel::Error, message)
    }

    fn new(event_type: &'static str, level: EventLevel, message: impl Into<String>) -> Self {
        Self {
            event_type,
            message: message.into(),
            level,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn into_event(self, id: Uuid, created_at: DateTime<Utc>) -> SystemEvent {
        SystemEvent {
            id,
            event_type: self.event_type.to_string(),
            message: self.message,
            level: self.level,
            metadata: self.metadata,
            created_at,
        }
    }
}

/// Event type constants.
pub mod event_type {
    pub const BOT_STARTED: &str = "BOT_STARTED";
    pub const BOT_PAUSED: &str = "BOT_PAUSED";
    pub const BOT_STOPPED: &str = "BOT_STOPPED";
    pub const MODE_SWITCHED: &str = "MODE_SWITCHED";
    pub const ANALYTICS_RESET: &str = "ANALYTICS_RESET";
    pub const SETTINGS_UPDATED: &str = "SETTINGS_UPDATED";
    pub const WALLET_ADDED: &str = "WALLET_ADDED";
    pub const WALLET_ACTIVATED: &str = "WALLET_ACTIVATED";
    pub const WALLET_DEACTIVATED: &str = "WALLET_DEACTIVATED";
    pub const WALLET_FETCH_FAILED: &str = "WALLET_FETCH_FAILED";
    pub const TRADE_SKIPPED: &str = "TRADE_SKIPPED";
    pub const RISK_BLOCKED: &str = "RISK_BLOCKED";
    pub const TRADE_SIMULATED: &str = "TRADE_SIMULATED";
    pub const TRADE_EXECUTED: &str = "TRADE_EXECUTED";
    pub const TRADE_FAILED: &str = "TRADE_FAILED";
    pub const PIPELINE_ERROR: &str = "PIPELINE_ERROR";
}
