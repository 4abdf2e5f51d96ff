//! Operator actions on the tracked wallet list.

use serde_json::json;
use uuid::Uuid;

use crate::ledger::TradeLedger;
use crate::models::event::event_type;
use crate::models::{canonical_address, LeaderWallet, NewSystemEvent, WalletError};

/// Start tracking a wallet. An existing but inactive wallet is reactivated
/// instead of duplicated.
pub async fn add_wallet(
    ledger: &dyn TradeLedger,
    raw_address: &str,
    nickname: Option<&str>,
) -> Result<LeaderWallet, WalletError> {
    let address = canonical_address(raw_address)?;
    let nickname = nickname.map(str::trim).filter(|n| !n.is_empty());

    if let Some(existing) = ledger.find_wallet_by_address(&address).await? {
        if existing.is_active {
            return Err(WalletError::AlreadyTracked(address));
        }
        return set_active(ledger, existing.id, true).await;
    }

    // A concurrent add can win between the lookup and the insert.
    let wallet = ledger
        .insert_wallet(&address, nickname)
        .await?
        .ok_or_else(|| WalletError::AlreadyTracked(address.clone()))?;
    tracing::info!(wallet = %wallet.address, id = %wallet.id, "Leader wallet added");

    ledger
        .record_event(
            NewSystemEvent::info(event_type::WALLET_ADDED, format!("Tracking {}", wallet.address))
                .with_metadata(json!({
                    "wallet_id": wallet.id,
                    "address": wallet.address,
                    "nickname": wallet.nickname,
                })),
        )
        .await?;

    Ok(wallet)
}

/// Stop monitoring a wallet. Its trade history is kept.
pub async fn deactivate_wallet(
    ledger: &dyn TradeLedger,
    id: Uuid,
) -> Result<LeaderWallet, WalletError> {
    set_active(ledger, id, false).await
}

pub async fn activate_wallet(ledger: &dyn TradeLedger, id: Uuid) -> Result<LeaderWallet, WalletError> {
    set_active(ledger, id, true).await
}

async fn set_active(
    ledger: &dyn TradeLedger,
    id: Uuid,
    is_active: bool,
) -> Result<LeaderWallet, WalletError> {
    let wallet = ledger
        .set_wallet_active(id, is_active)
        .await?
        .ok_or(WalletError::NotFound(id))?;

    let (kind, verb) = if is_active {
        (event_type::WALLET_ACTIVATED, "activated")
    } else {
        (event_type::WALLET_DEACTIVATED, "deactivated")
    };
    tracing::info!(wallet = %wallet.address, id = %wallet.id, "Leader wallet {verb}");

    ledger
        .record_event(
            NewSystemEvent::info(kind, format!("Wallet {} {verb}", wallet.address))
                .with_metadata(json!({ "wallet_id": wallet.id, "address": wallet.address })),
        )
        .await?;

    Ok(wallet)
}
