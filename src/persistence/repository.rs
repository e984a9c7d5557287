//! Database Repository
//!
//! Data access layer for samples and daily baselines.

use super::models::*;
use super::{DatabaseError, DbPool};
use chrono::{DateTime, Utc};
use tracing::{debug, error};

use crate::domain::entities::reading::CumulativeCounters;
use crate::domain::entities::sample::Sample;

/// Sample repository
#[derive(Clone)]
pub struct SampleRepository {
    pool: DbPool,
}

impl SampleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Append one sample
    pub async fn insert(&self, sample: &Sample) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO samples (
                timestamp, solar_w, battery_w, grid_w, load_w,
                battery_soe, battery_status
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(sample.timestamp)
        .bind(sample.solar_w)
        .bind(sample.battery_w)
        .bind(sample.grid_w)
        .bind(sample.load_w)
        .bind(sample.battery_soe)
        .bind(sample.battery_status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to insert sample: {}", e);
            DatabaseError::QueryError(format!("Failed to insert sample: {}", e))
        })?;

        debug!("Persisted sample at {}", sample.timestamp);
        Ok(())
    }

    /// Samples at or after the cutoff, oldest first
    pub async fn since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Sample>, DatabaseError> {
        let records = sqlx::query_as::<_, SampleRecord>(
            "SELECT * FROM samples WHERE timestamp >= ?1 ORDER BY timestamp ASC",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to query samples: {}", e);
            DatabaseError::QueryError(format!("Failed to query samples: {}", e))
        })?;

        Ok(records.into_iter().map(Sample::from).collect())
    }

    /// Samples in the half-open window `(start, end]`, oldest first
    pub async fn between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Sample>, DatabaseError> {
        let records = sqlx::query_as::<_, SampleRecord>(
            "SELECT * FROM samples WHERE timestamp > ?1 AND timestamp <= ?2 ORDER BY timestamp ASC",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to query sample window: {}", e);
            DatabaseError::QueryError(format!("Failed to query sample window: {}", e))
        })?;

        Ok(records.into_iter().map(Sample::from).collect())
    }

    /// Drop samples older than the cutoff, keeping history finite
    pub async fn trim_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let deleted = sqlx::query("DELETE FROM samples WHERE timestamp < ?1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to trim samples: {}", e);
                DatabaseError::QueryError(format!("Failed to trim samples: {}", e))
            })?
            .rows_affected();

        if deleted > 0 {
            debug!("Trimmed {} samples older than {}", deleted, cutoff);
        }
        Ok(deleted)
    }
}

/// Daily baseline repository
#[derive(Clone)]
pub struct BaselineRepository {
    pool: DbPool,
}

impl BaselineRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Baseline for a local calendar date, inserting the given counters
    /// when the date has none yet.
    ///
    /// `INSERT OR IGNORE` against the primary key makes this race-free
    /// under concurrent pollers at day rollover: the losing writer's
    /// insert is a no-op and the follow-up read returns the winner.
    pub async fn get_or_insert(
        &self,
        date: &str,
        counters: &CumulativeCounters,
    ) -> Result<BaselineRecord, DatabaseError> {
        let inserted = sqlx::query(
            r#"
            INSERT OR IGNORE INTO baselines (
                date, solar_exported_wh, battery_exported_wh,
                battery_imported_wh, grid_imported_wh, grid_exported_wh,
                load_imported_wh, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(date)
        .bind(counters.solar_exported_wh)
        .bind(counters.battery_exported_wh)
        .bind(counters.battery_imported_wh)
        .bind(counters.grid_imported_wh)
        .bind(counters.grid_exported_wh)
        .bind(counters.load_imported_wh)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to insert baseline for {}: {}", date, e);
            DatabaseError::QueryError(format!("Failed to insert baseline: {}", e))
        })?
        .rows_affected();

        if inserted > 0 {
            debug!("Recorded baseline for {}", date);
        }

        let record =
            sqlx::query_as::<_, BaselineRecord>("SELECT * FROM baselines WHERE date = ?1")
                .bind(date)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    error!("Failed to read baseline for {}: {}", date, e);
                    DatabaseError::QueryError(format!("Failed to read baseline: {}", e))
                })?;

        Ok(record)
    }

    /// Most recent baselines, newest first
    pub async fn recent(&self, days: u32) -> Result<Vec<BaselineRecord>, DatabaseError> {
        let records = sqlx::query_as::<_, BaselineRecord>(
            "SELECT * FROM baselines ORDER BY date DESC LIMIT ?1",
        )
        .bind(days as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to query baselines: {}", e);
            DatabaseError::QueryError(format!("Failed to query baselines: {}", e))
        })?;

        Ok(records)
    }
}
