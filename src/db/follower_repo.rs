use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{FollowerTrade, NewFollowerTrade};

#[derive(FromRow)]
struct FollowerTradeRow {
    id: Uuid,
    leader_trade_id: Option<Uuid>,
    market_id: String,
    outcome_id: String,
    side: String,
    size: Decimal,
    price: Decimal,
    status: String,
    is_dry_run: bool,
    pnl: Decimal,
    order_id: Option<String>,
    error_message: Option<String>,
    executed_at: DateTime<Utc>,
}

impl TryFrom<FollowerTradeRow> for FollowerTrade {
    type Error = anyhow::Error;

    fn try_from(row: FollowerTradeRow) -> Result<Self, Self::Error> {
        Ok(FollowerTrade {
            id: row.id,
            leader_trade_id: row.leader_trade_id,
            market_id: row.market_id,
            outcome_id: row.outcome_id,
            side: row.side.parse()?,
            size: row.size,
            price: row.price,
            status: row.status.parse()?,
            is_dry_run: row.is_dry_run,
            pnl: row.pnl,
            order_id: row.order_id,
            error_message: row.error_message,
            executed_at: row.executed_at,
        })
    }
}

/// Insert a follower trade inside the caller's transaction.
pub async fn insert_trade(
    conn: &mut PgConnection,
    trade: &NewFollowerTrade,
    pnl: Decimal,
) -> anyhow::Result<FollowerTrade> {
    let row = sqlx::query_as::<_, FollowerTradeRow>(
        r#"
        INSERT INTO follower_trades
            (id, leader_trade_id, market_id, outcome_id, side, size, price,
             status, is_dry_run, pnl, order_id, error_message, executed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(trade.leader_trade_id)
    .bind(&trade.market_id)
    .bind(&trade.outcome_id)
    .bind(trade.side.as_str())
    .bind(trade.size)
    .bind(trade.price)
    .bind(trade.status.as_str())
    .bind(trade.is_dry_run)
    .bind(pnl)
    .bind(&trade.order_id)
    .bind(&trade.error_message)
    .bind(trade.executed_at)
    .fetch_one(conn)
    .await?;

    row.try_into()
}

pub async fn get_recent_trades(pool: &PgPool, limit: i64) -> anyhow::Result<Vec<FollowerTrade>> {
    let rows = sqlx::query_as::<_, FollowerTradeRow>(
        "SELECT * FROM follower_trades ORDER BY executed_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(FollowerTrade::try_from).collect()
}

/// Count attempts of any status executed at or after `since`.
pub async fn count_since(pool: &PgPool, since: DateTime<Utc>) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM follower_trades WHERE executed_at >= $1")
        .bind(since)
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}

/// Sum of realised PnL executed at or after `since`.
/// (all trades, trades with pnl > 0, Σ positive pnl)
pub async fn profit_summary(pool: &PgPool) -> anyhow::Result<(i64, i64, Decimal)> {
    let row: (i64, i64, Option<Decimal>) = sqlx::query_as(
        r#"
        SELECT COUNT(*),
               COUNT(*) FILTER (WHERE pnl > 0),
               SUM(pnl) FILTER (WHERE pnl > 0)
        FROM follower_trades
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok((row.0, row.1, row.2.unwrap_or(Decimal::ZERO)))
}

pub async fn pnl_since(pool: &PgPool, since: DateTime<Utc>) -> anyhow::Result<Decimal> {
    let row: (Option<Decimal>,) =
        sqlx::query_as("SELECT SUM(pnl) FROM follower_trades WHERE executed_at >= $1")
            .bind(since)
            .fetch_one(pool)
            .await?;

    Ok(row.0.unwrap_or(Decimal::ZERO))
}
