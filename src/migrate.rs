use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Create the database file and schema. Idempotent.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create all tables on an existing pool.
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    // One merged snapshot per event; items and recipe_ids are JSON text.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS grocery_cache (
            event_id TEXT PRIMARY KEY,
            items TEXT NOT NULL,
            recipe_ids TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_grocery_cache_updated_at ON grocery_cache(updated_at DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
