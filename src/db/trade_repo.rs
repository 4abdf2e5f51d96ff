use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::{LeaderTrade, NewLeaderTrade};

#[derive(FromRow)]
struct LeaderTradeRow {
    id: Uuid,
    external_trade_id: String,
    wallet_id: Uuid,
    market_id: String,
    outcome_id: String,
    side: String,
    size: Decimal,
    price: Decimal,
    executed_at: DateTime<Utc>,
    category: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LeaderTradeRow> for LeaderTrade {
    type Error = anyhow::Error;

    fn try_from(row: LeaderTradeRow) -> Result<Self, Self::Error> {
        Ok(LeaderTrade {
            id: row.id,
            external_trade_id: row.external_trade_id,
            wallet_id: row.wallet_id,
            market_id: row.market_id,
            outcome_id: row.outcome_id,
            side: row.side.parse()?,
            size: row.size,
            price: row.price,
            executed_at: row.executed_at,
            category: row.category,
            created_at: row.created_at,
        })
    }
}

/// Insert a leader trade unless its external id is already stored.
/// Returns `None` on a duplicate.
pub async fn insert_trade(pool: &PgPool, trade: &NewLeaderTrade) -> anyhow::Result<Option<LeaderTrade>> {
    let row = sqlx::query_as::<_, LeaderTradeRow>(
        r#"
        INSERT INTO leader_trades
            (id, external_trade_id, wallet_id, market_id, outcome_id, side, size, price, executed_at, category)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (external_trade_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&trade.external_trade_id)
    .bind(trade.wallet_id)
    .bind(&trade.market_id)
    .bind(&trade.outcome_id)
    .bind(trade.side.as_str())
    .bind(trade.size)
    .bind(trade.price)
    .bind(trade.executed_at)
    .bind(&trade.category)
    .fetch_optional(pool)
    .await?;

    row.map(LeaderTrade::try_from).transpose()
}

/// Most recent leader trades by execution time.
pub async fn get_recent_trades(pool: &PgPool, limit: i64) -> anyhow::Result<Vec<LeaderTrade>> {
    let rows = sqlx::query_as::<_, LeaderTradeRow>(
        "SELECT * FROM leader_trades ORDER BY executed_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(LeaderTrade::try_from).collect()
}
