use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A tracked leader wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct LeaderWallet {
    pub id: Uuid,
    pub address: String,
    pub nickname: Option<String>,
    pub is_active: bool,
    pub last_monitored: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("invalid wallet address format: {0}")]
    InvalidAddress(String),

    #[error("wallet already tracked: {0}")]
    AlreadyTracked(String),

    #[error("wallet not found: {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Ledger(#[from] anyhow::Error),
}

/// Validate a wallet address and return its canonical lower-case form.
///
/// Accepts `0x` followed by exactly 40 hex digits, in any case.
pub fn canonical_address(raw: &str) -> Result<String, WalletError> {
    let trimmed = raw.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| WalletError::InvalidAddress(raw.to_string()))?;

    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(WalletError::InvalidAddress(raw.to_string()));
    }

    Ok(format!("0x{}", hex.to_ascii_lowercase()))
}
