//! Whole-document JSON snapshots for the bounded lists and settings.
//!
//! Each named document is one row; saving rewrites the row in a single
//! upsert, so a snapshot is either fully applied or not at all.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::Row;
use tracing::error;

use super::{DatabaseError, DbPool};

pub const ALERTS_DOC: &str = "alerts";
pub const ANALYTICS_DOC: &str = "analytics";
pub const SETTINGS_DOC: &str = "settings";

#[derive(Clone)]
pub struct DocumentStore {
    pool: DbPool,
}

impl DocumentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Load and deserialize a named document, `None` when absent.
    pub async fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, DatabaseError> {
        let row = sqlx::query("SELECT body FROM documents WHERE name = ?1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to load document {}: {}", name, e);
                DatabaseError::QueryError(format!("Failed to load document {}: {}", name, e))
            })?;

        match row {
            Some(row) => {
                let body: String = row.get("body");
                let value = serde_json::from_str(&body).map_err(|e| {
                    error!("Document {} is not valid JSON: {}", name, e);
                    DatabaseError::QueryError(format!("Document {} corrupt: {}", name, e))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Persist a full snapshot of a named document.
    pub async fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<(), DatabaseError> {
        let body = serde_json::to_string(value).map_err(|e| {
            DatabaseError::QueryError(format!("Failed to serialize document {}: {}", name, e))
        })?;

        sqlx::query(
            r#"
            INSERT INTO documents (name, body, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(name) DO UPDATE SET body = ?2, updated_at = ?3
            "#,
        )
        .bind(name)
        .bind(body)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to save document {}: {}", name, e);
            DatabaseError::QueryError(format!("Failed to save document {}: {}", name, e))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::settings::Settings;
    use crate::persistence::init_database;

    #[tokio::test]
    async fn test_load_missing_document() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        let docs = DocumentStore::new(pool);

        let loaded: Option<Settings> = docs.load(SETTINGS_DOC).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_roundtrip_and_overwrite() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        let docs = DocumentStore::new(pool);

        let mut settings = Settings::default();
        docs.save(SETTINGS_DOC, &settings).await.unwrap();

        settings.battery_low_pct = 35.0;
        docs.save(SETTINGS_DOC, &settings).await.unwrap();

        let loaded: Settings = docs.load(SETTINGS_DOC).await.unwrap().unwrap();
        assert_eq!(loaded.battery_low_pct, 35.0);
        assert_eq!(loaded.theme, "dark");
    }
}
