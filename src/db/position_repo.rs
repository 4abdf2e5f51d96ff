use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::models::Position;

/// Make sure a row exists so it can be locked. A fresh row starts empty
/// (size 0, average 0) and merges like a missing position.
pub async fn ensure_row(
    conn: &mut PgConnection,
    market_id: &str,
    outcome_id: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO positions (market_id, outcome_id, size, average_price, updated_at)
        VALUES ($1, $2, 0, 0, $3)
        ON CONFLICT (market_id, outcome_id) DO NOTHING
        "#,
    )
    .bind(market_id)
    .bind(outcome_id)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(())
}

/// Read the position and hold its row lock until the transaction ends.
pub async fn lock_position(
    conn: &mut PgConnection,
    market_id: &str,
    outcome_id: &str,
) -> anyhow::Result<Option<Position>> {
    let position = sqlx::query_as::<_, Position>(
        "SELECT * FROM positions WHERE market_id = $1 AND outcome_id = $2 FOR UPDATE",
    )
    .bind(market_id)
    .bind(outcome_id)
    .fetch_optional(conn)
    .await?;

    Ok(position)
}

pub async fn update_position(conn: &mut PgConnection, position: &Position) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE positions
        SET size = $3, average_price = $4, unrealized_pnl = $5, updated_at = $6
        WHERE market_id = $1 AND outcome_id = $2
        "#,
    )
    .bind(&position.market_id)
    .bind(&position.outcome_id)
    .bind(position.size)
    .bind(position.average_price)
    .bind(position.unrealized_pnl)
    .bind(position.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn delete_position(
    conn: &mut PgConnection,
    market_id: &str,
    outcome_id: &str,
) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM positions WHERE market_id = $1 AND outcome_id = $2")
        .bind(market_id)
        .bind(outcome_id)
        .execute(conn)
        .await?;

    Ok(())
}

/// Get all open positions, most recently touched first.
pub async fn get_open_positions(pool: &PgPool) -> anyhow::Result<Vec<Position>> {
    let positions = sqlx::query_as::<_, Position>(
        "SELECT * FROM positions WHERE size > 0 ORDER BY updated_at DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(positions)
}

/// Count distinct markets with an open position.
pub async fn count_open_markets(pool: &PgPool) -> anyhow::Result<i64> {
    let row: (i64,) =
        sqlx::query_as("SELECT COUNT(DISTINCT market_id) FROM positions WHERE size > 0")
            .fetch_one(pool)
            .await?;

    Ok(row.0)
}

/// Σ(size × average_price) over positions in one market.
pub async fn market_exposure(pool: &PgPool, market_id: &str) -> anyhow::Result<Decimal> {
    let row: (Option<Decimal>,) = sqlx::query_as(
        "SELECT SUM(size * average_price) FROM positions WHERE market_id = $1",
    )
    .bind(market_id)
    .fetch_one(pool)
    .await?;

    Ok(row.0.unwrap_or(Decimal::ZERO))
}
