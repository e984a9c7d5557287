//! Active alert list: a bounded set keyed by alert kind.
//!
//! A candidate whose id is already present is suppressed — once raised,
//! a kind stays active until cleared explicitly, even if the condition
//! worsens or recovers. Every mutation persists a whole-document
//! snapshot.

use tokio::sync::RwLock;
use tracing::warn;

use crate::domain::entities::alert::Alert;
use crate::persistence::documents::{DocumentStore, ALERTS_DOC};

/// Most-recent entries kept; oldest dropped first.
const MAX_ALERTS: usize = 100;

pub struct AlertStore {
    // Newest first.
    alerts: RwLock<Vec<Alert>>,
    docs: DocumentStore,
}

impl AlertStore {
    pub async fn load(docs: DocumentStore) -> Self {
        let alerts = match docs.load::<Vec<Alert>>(ALERTS_DOC).await {
            Ok(Some(alerts)) => alerts,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("alerts document unreadable, starting empty: {}", e);
                Vec::new()
            }
        };

        AlertStore {
            alerts: RwLock::new(alerts),
            docs,
        }
    }

    /// Raise a candidate alert. Returns the alert when it was actually
    /// appended, `None` when its kind is already active.
    pub async fn raise(&self, candidate: Alert) -> Option<Alert> {
        let mut alerts = self.alerts.write().await;
        if alerts.iter().any(|a| a.id == candidate.id) {
            return None;
        }

        alerts.insert(0, candidate.clone());
        alerts.truncate(MAX_ALERTS);
        self.persist(&alerts).await;

        Some(candidate)
    }

    /// Clear an active alert by kind id. Returns whether anything was
    /// removed; the next breach of the kind re-raises it.
    pub async fn clear(&self, id: &str) -> bool {
        let mut alerts = self.alerts.write().await;
        let before = alerts.len();
        alerts.retain(|a| a.id != id);

        let removed = alerts.len() != before;
        if removed {
            self.persist(&alerts).await;
        }
        removed
    }

    /// Most recent alerts first.
    pub async fn list(&self, limit: usize) -> Vec<Alert> {
        let alerts = self.alerts.read().await;
        alerts.iter().take(limit).cloned().collect()
    }

    async fn persist(&self, alerts: &[Alert]) {
        // A failed snapshot write must not abort the pipeline; the
        // in-memory list stays authoritative until the next mutation.
        if let Err(e) = self.docs.save(ALERTS_DOC, &alerts).await {
            warn!("alerts snapshot not persisted: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::alert::AlertSeverity;
    use crate::persistence::init_database;

    fn battery_low() -> Alert {
        Alert::new(
            "battery-low",
            "battery",
            AlertSeverity::High,
            "Battery Low",
            "Battery at 15%".to_string(),
        )
    }

    async fn store() -> AlertStore {
        let pool = init_database("sqlite::memory:").await.unwrap();
        AlertStore::load(DocumentStore::new(pool)).await
    }

    #[tokio::test]
    async fn test_duplicate_kind_is_suppressed() {
        let store = store().await;

        assert!(store.raise(battery_low()).await.is_some());
        assert!(store.raise(battery_low()).await.is_none());

        assert_eq!(store.list(10).await.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_then_rebreach_re_raises() {
        let store = store().await;

        assert!(store.raise(battery_low()).await.is_some());
        assert!(store.clear("battery-low").await);
        assert!(!store.clear("battery-low").await);
        assert!(store.raise(battery_low()).await.is_some());
    }

    #[tokio::test]
    async fn test_list_newest_first_with_limit() {
        let store = store().await;

        store.raise(battery_low()).await;
        store
            .raise(Alert::new(
                "grid-down",
                "grid",
                AlertSeverity::Critical,
                "Grid Down",
                "Grid power at 0 W".to_string(),
            ))
            .await;

        let listed = store.list(1).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "grid-down");
    }

    #[tokio::test]
    async fn test_bounded_to_most_recent() {
        let store = store().await;

        for i in 0..110 {
            store
                .raise(Alert::new(
                    &format!("kind-{}", i),
                    "battery",
                    AlertSeverity::Low,
                    "Test",
                    String::new(),
                ))
                .await;
        }

        let listed = store.list(200).await;
        assert_eq!(listed.len(), 100);
        // Oldest entries were dropped first.
        assert_eq!(listed[0].id, "kind-109");
        assert_eq!(listed[99].id, "kind-10");
    }

    #[tokio::test]
    async fn test_snapshot_survives_reload() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        let docs = DocumentStore::new(pool);

        let store = AlertStore::load(docs.clone()).await;
        store.raise(battery_low()).await;

        let reloaded = AlertStore::load(docs).await;
        assert_eq!(reloaded.list(10).await.len(), 1);
        // Still de-duplicated against the persisted entry.
        assert!(reloaded.raise(battery_low()).await.is_none());
    }
}
