use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use crate::models::Settings;

#[derive(FromRow)]
struct SettingsRow {
    global_trading_mode: String,
    global_trading_status: String,
    dry_run_enabled: bool,
    copy_trade_percentage: Decimal,
    max_trade_amount: Decimal,
    min_market_volume: Decimal,
    max_days_to_resolution: i64,
    max_open_markets: i64,
    max_exposure_per_market: Decimal,
    daily_loss_limit: Decimal,
    max_trades_per_hour: i64,
    last_mode_switch: Option<DateTime<Utc>>,
    test_mode_started: Option<DateTime<Utc>>,
    live_mode_started: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SettingsRow> for Settings {
    type Error = anyhow::Error;

    fn try_from(row: SettingsRow) -> Result<Self, Self::Error> {
        Ok(Settings {
            global_trading_mode: row.global_trading_mode.parse()?,
            global_trading_status: row.global_trading_status.parse()?,
            dry_run_enabled: row.dry_run_enabled,
            copy_trade_percentage: row.copy_trade_percentage,
            max_trade_amount: row.max_trade_amount,
            min_market_volume: row.min_market_volume,
            max_days_to_resolution: row.max_days_to_resolution,
            max_open_markets: row.max_open_markets,
            max_exposure_per_market: row.max_exposure_per_market,
            daily_loss_limit: row.daily_loss_limit,
            max_trades_per_hour: row.max_trades_per_hour,
            last_mode_switch: row.last_mode_switch,
            test_mode_started: row.test_mode_started,
            live_mode_started: row.live_mode_started,
            updated_at: row.updated_at,
        })
    }
}

const UPSERT: &str = r#"
    INSERT INTO settings (
        id, global_trading_mode, global_trading_status, dry_run_enabled,
        copy_trade_percentage, max_trade_amount, min_market_volume,
        max_days_to_resolution, max_open_markets, max_exposure_per_market,
        daily_loss_limit, max_trades_per_hour, last_mode_switch,
        test_mode_started, live_mode_started, updated_at
    )
    VALUES (1, $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, NOW())
"#;

/// Load the singleton settings row, creating it with defaults if missing.
pub async fn load_settings(pool: &PgPool) -> anyhow::Result<Settings> {
    let existing = sqlx::query_as::<_, SettingsRow>("SELECT * FROM settings WHERE id = 1")
        .fetch_optional(pool)
        .await?;

    if let Some(row) = existing {
        return row.try_into();
    }

    // Concurrent first loads race on the insert; the loser reads the winner's row.
    let defaults = Settings::default();
    bind_settings(sqlx::query(&format!("{UPSERT} ON CONFLICT (id) DO NOTHING")), &defaults)
        .execute(pool)
        .await?;

    let row = sqlx::query_as::<_, SettingsRow>("SELECT * FROM settings WHERE id = 1")
        .fetch_one(pool)
        .await?;
    tracing::info!("Settings row created with defaults");

    row.try_into()
}

/// Overwrite the settings row and return it as stored.
pub async fn save_settings(pool: &PgPool, settings: &Settings) -> anyhow::Result<Settings> {
    let sql = format!(
        r#"{UPSERT}
        ON CONFLICT (id) DO UPDATE SET
            global_trading_mode = EXCLUDED.global_trading_mode,
            global_trading_status = EXCLUDED.global_trading_status,
            dry_run_enabled = EXCLUDED.dry_run_enabled,
            copy_trade_percentage = EXCLUDED.copy_trade_percentage,
            max_trade_amount = EXCLUDED.max_trade_amount,
            min_market_volume = EXCLUDED.min_market_volume,
            max_days_to_resolution = EXCLUDED.max_days_to_resolution,
            max_open_markets = EXCLUDED.max_open_markets,
            max_exposure_per_market = EXCLUDED.max_exposure_per_market,
            daily_loss_limit = EXCLUDED.daily_loss_limit,
            max_trades_per_hour = EXCLUDED.max_trades_per_hour,
            last_mode_switch = EXCLUDED.last_mode_switch,
            test_mode_started = EXCLUDED.test_mode_started,
            live_mode_started = EXCLUDED.live_mode_started,
            updated_at = EXCLUDED.updated_at
        "#
    );

    bind_settings(sqlx::query(&sql), settings).execute(pool).await?;

    let row = sqlx::query_as::<_, SettingsRow>("SELECT * FROM settings WHERE id = 1")
        .fetch_one(pool)
        .await?;

    row.try_into()
}

fn bind_settings<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    settings: &Settings,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(settings.global_trading_mode.as_str())
        .bind(settings.global_trading_status.as_str())
        .bind(settings.dry_run_enabled)
        .bind(settings.copy_trade_percentage)
        .bind(settings.max_trade_amount)
        .bind(settings.min_market_volume)
        .bind(settings.max_days_to_resolution)
        .bind(settings.max_open_markets)
        .bind(settings.max_exposure_per_market)
        .bind(settings.daily_loss_limit)
        .bind(settings.max_trades_per_hour)
        .bind(settings.last_mode_switch)
        .bind(settings.test_mode_started)
        .bind(settings.live_mode_started)
}
