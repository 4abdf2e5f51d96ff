pub mod event_repo;
pub mod follower_repo;
pub mod pg_ledger;
pub mod position_repo;
pub mod settings_repo;
pub mod trade_repo;
pub mod wallet_repo;

pub use pg_ledger::PgLedger;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub async fn init_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    // Verify connectivity
    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(pool)
}

/// Apply pending schema migrations from `migrations/`.
pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
