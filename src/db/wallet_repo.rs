use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::LeaderWallet;

/// Insert a new leader wallet. The address must already be canonical.
/// Returns `None` if the address is taken.
pub async fn insert_wallet(
    pool: &PgPool,
    address: &str,
    nickname: Option<&str>,
) -> anyhow::Result<Option<LeaderWallet>> {
    let wallet = sqlx::query_as::<_, LeaderWallet>(
        r#"
        INSERT INTO leader_wallets (id, address, nickname)
        VALUES ($1, $2, $3)
        ON CONFLICT (address) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(address)
    .bind(nickname)
    .fetch_optional(pool)
    .await?;

    Ok(wallet)
}

pub async fn get_wallet_by_address(
    pool: &PgPool,
    address: &str,
) -> anyhow::Result<Option<LeaderWallet>> {
    let wallet = sqlx::query_as::<_, LeaderWallet>(
        "SELECT * FROM leader_wallets WHERE address = $1",
    )
    .bind(address)
    .fetch_optional(pool)
    .await?;

    Ok(wallet)
}

/// All wallets, or only active ones, oldest first.
pub async fn list_wallets(pool: &PgPool, active_only: bool) -> anyhow::Result<Vec<LeaderWallet>> {
    let wallets = sqlx::query_as::<_, LeaderWallet>(
        "SELECT * FROM leader_wallets WHERE is_active OR NOT $1 ORDER BY created_at",
    )
    .bind(active_only)
    .fetch_all(pool)
    .await?;

    Ok(wallets)
}

pub async fn count_active(pool: &PgPool) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM leader_wallets WHERE is_active")
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}

pub async fn set_active(
    pool: &PgPool,
    id: Uuid,
    is_active: bool,
) -> anyhow::Result<Option<LeaderWallet>> {
    let wallet = sqlx::query_as::<_, LeaderWallet>(
        "UPDATE leader_wallets SET is_active = $2 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(is_active)
    .fetch_optional(pool)
    .await?;

    Ok(wallet)
}

pub async fn set_last_monitored(pool: &PgPool, id: Uuid, at: DateTime<Utc>) -> anyhow::Result<()> {
    sqlx::query("UPDATE leader_wallets SET last_monitored = $2 WHERE id = $1")
        .bind(id)
        .bind(at)
        .execute(pool)
        .await?;

    Ok(())
}
