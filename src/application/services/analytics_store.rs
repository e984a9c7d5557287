//! Rolling window of hourly analytics entries.

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::warn;

use crate::domain::entities::analytics::AnalyticsEntry;
use crate::persistence::documents::{DocumentStore, ANALYTICS_DOC};

/// Rolling window size: 720 hourly entries, about 30 days.
const MAX_ENTRIES: usize = 720;

pub struct AnalyticsStore {
    // Oldest first.
    entries: RwLock<Vec<AnalyticsEntry>>,
    docs: DocumentStore,
}

impl AnalyticsStore {
    pub async fn load(docs: DocumentStore) -> Self {
        let entries = match docs.load::<Vec<AnalyticsEntry>>(ANALYTICS_DOC).await {
            Ok(Some(entries)) => entries,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("analytics document unreadable, starting empty: {}", e);
                Vec::new()
            }
        };

        AnalyticsStore {
            entries: RwLock::new(entries),
            docs,
        }
    }

    /// Append an hourly entry, dropping the oldest beyond the window.
    pub async fn push(&self, entry: AnalyticsEntry) {
        let mut entries = self.entries.write().await;
        entries.push(entry);

        let overflow = entries.len().saturating_sub(MAX_ENTRIES);
        if overflow > 0 {
            entries.drain(..overflow);
        }

        if let Err(e) = self.docs.save(ANALYTICS_DOC, &*entries).await {
            warn!("analytics snapshot not persisted: {}", e);
        }
    }

    /// Entries at or after the cutoff, oldest first.
    pub async fn since(&self, cutoff: DateTime<Utc>) -> Vec<AnalyticsEntry> {
        let entries = self.entries.read().await;
        entries.iter().filter(|e| e.hour >= cutoff).cloned().collect()
    }
}
