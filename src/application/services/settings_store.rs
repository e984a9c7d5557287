//! In-process settings singleton backed by a whole-document snapshot.

use tokio::sync::RwLock;
use tracing::warn;

use crate::domain::entities::settings::Settings;
use crate::persistence::documents::{DocumentStore, SETTINGS_DOC};
use crate::persistence::DatabaseError;

pub struct SettingsStore {
    current: RwLock<Settings>,
    docs: DocumentStore,
}

impl SettingsStore {
    /// Load persisted settings, falling back to defaults when nothing
    /// is stored yet or the stored document cannot be read.
    pub async fn load(docs: DocumentStore) -> Self {
        let current = match docs.load::<Settings>(SETTINGS_DOC).await {
            Ok(Some(settings)) => settings,
            Ok(None) => Settings::default(),
            Err(e) => {
                warn!("settings document unreadable, using defaults: {}", e);
                Settings::default()
            }
        };

        SettingsStore {
            current: RwLock::new(current),
            docs,
        }
    }

    /// Consistent snapshot for one evaluation pass.
    pub async fn snapshot(&self) -> Settings {
        self.current.read().await.clone()
    }

    /// Replace the settings and persist the new snapshot.
    pub async fn update(&self, settings: Settings) -> Result<Settings, DatabaseError> {
        self.docs.save(SETTINGS_DOC, &settings).await?;
        *self.current.write().await = settings.clone();
        Ok(settings)
    }
}
