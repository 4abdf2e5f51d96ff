use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::{NewSystemEvent, SystemEvent};

#[derive(FromRow)]
struct SystemEventRow {
    id: Uuid,
    event_type: String,
    message: String,
    level: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl TryFrom<SystemEventRow> for SystemEvent {
    type Error = anyhow::Error;

    fn try_from(row: SystemEventRow) -> Result<Self, Self::Error> {
        Ok(SystemEvent {
            id: row.id,
            event_type: row.event_type,
            message: row.message,
            level: row.level.parse()?,
            metadata: row.metadata,
            created_at: row.created_at,
        })
    }
}

/// Append an audit event.
pub async fn insert_event(pool: &PgPool, event: &NewSystemEvent) -> anyhow::Result<SystemEvent> {
    let row = sqlx::query_as::<_, SystemEventRow>(
        r#"
        INSERT INTO system_events (id, event_type, message, level, metadata)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(event.event_type)
    .bind(&event.message)
    .bind(event.level.as_str())
    .bind(&event.metadata)
    .fetch_one(pool)
    .await?;

    row.try_into()
}

pub async fn get_recent_events(pool: &PgPool, limit: i64) -> anyhow::Result<Vec<SystemEvent>> {
    let rows = sqlx::query_as::<_, SystemEventRow>(
        "SELECT * FROM system_events ORDER BY created_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(SystemEvent::try_from).collect()
}
