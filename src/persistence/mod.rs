//! Persistence Layer
//!
//! SQLite storage for the energy pipeline, with async operations via
//! sqlx.
//!
//! # Database Schema
//!
//! ## Samples Table
//! Append-only time series, one row per successful poll:
//! - timestamp: poll time (indexed)
//! - solar_w / battery_w / grid_w / load_w: instantaneous watts
//! - battery_soe: state-of-energy percent
//! - battery_status: "charging", "discharging", or "standby"
//!
//! ## Baselines Table
//! One row per local calendar date, keyed by `date` (`YYYY-MM-DD`):
//! the cumulative counters observed at the first poll of that day.
//! The primary key is what makes insert-if-absent race-free.
//!
//! ## Documents Table
//! Whole-document JSON snapshots for the bounded lists (alerts,
//! analytics) and settings, keyed by name and rewritten on every
//! mutation.

pub mod documents;
pub mod models;
pub mod repository;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::domain::errors::PipelineError;

/// Database connection pool
pub type DbPool = SqlitePool;

/// Database initialization error
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Query error: {0}")]
    QueryError(String),
}

impl From<DatabaseError> for PipelineError {
    fn from(err: DatabaseError) -> Self {
        PipelineError::Persistence(err.to_string())
    }
}

/// Initialize the database connection pool
///
/// # Arguments
/// - `database_url`: Path to SQLite database file (e.g., "sqlite://data/hearth.db")
///
/// # Errors
/// Returns error if database connection fails or migrations fail
pub async fn init_database(database_url: &str) -> Result<DbPool, DatabaseError> {
    info!("Initializing database: {}", database_url);

    // Ensure data directory exists
    if let Some(db_path) = database_url.strip_prefix("sqlite://") {
        if let Some(parent) = Path::new(db_path).parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::ConnectionError(sqlx::Error::Configuration(Box::new(e)))
            })?;
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .log_statements(tracing::log::LevelFilter::Debug);

    // An in-memory database exists per connection, so it must not be
    // spread across a pool.
    let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    info!("✓ Database initialized successfully");

    Ok(pool)
}

/// Run database migrations
async fn run_migrations(pool: &DbPool) -> Result<(), DatabaseError> {
    info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS samples (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp DATETIME NOT NULL,
            solar_w INTEGER NOT NULL,
            battery_w INTEGER NOT NULL,
            grid_w INTEGER NOT NULL,
            load_w INTEGER NOT NULL,
            battery_soe REAL NOT NULL,
            battery_status TEXT NOT NULL
                CHECK(battery_status IN ('charging', 'discharging', 'standby'))
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::MigrationError(format!("Failed to create samples table: {}", e)))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS baselines (
            date TEXT PRIMARY KEY,
            solar_exported_wh REAL NOT NULL,
            battery_exported_wh REAL NOT NULL,
            battery_imported_wh REAL NOT NULL,
            grid_imported_wh REAL NOT NULL,
            grid_exported_wh REAL NOT NULL,
            load_imported_wh REAL NOT NULL,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        DatabaseError::MigrationError(format!("Failed to create baselines table: {}", e))
    })?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            name TEXT PRIMARY KEY,
            body TEXT NOT NULL,
            updated_at DATETIME NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        DatabaseError::MigrationError(format!("Failed to create documents table: {}", e))
    })?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_samples_timestamp ON samples(timestamp)")
        .execute(pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(format!("Failed to create index: {}", e)))?;

    info!("✓ Database migrations completed successfully");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_init() {
        let pool = init_database("sqlite::memory:").await;
        assert!(pool.is_ok());
    }

    #[tokio::test]
    async fn test_migrations() {
        let pool = init_database("sqlite::memory:").await.unwrap();

        let result: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('samples', 'baselines', 'documents')"
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        assert_eq!(result.0, 3);
    }
}
