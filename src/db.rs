//! SQLite database connection management.
//!
//! Provides a connection pool with WAL mode enabled so the HTTP server can
//! read cached lists while another request writes one. The database file
//! and its parent directories are created automatically.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::config::Config;

/// Create a connection pool to the configured SQLite database.
///
/// # Errors
///
/// Returns an error if the database cannot be created or connected to.
pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let db_path = &config.db.path;

    let open_failed = || format!("Failed to open cache database {}", db_path.display());

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).with_context(open_failed)?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
        .with_context(open_failed)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .with_context(open_failed)?;

    Ok(pool)
}
