//! Process-scoped shared state handed to the HTTP layer and the
//! background tasks. One instance per process, passed by `Arc` instead
//! of living in module-level globals.

use std::sync::Arc;

use crate::application::broadcast::Broadcaster;
use crate::application::services::alert_store::AlertStore;
use crate::application::services::analytics_store::AnalyticsStore;
use crate::application::services::pipeline::EnergyPipeline;
use crate::application::services::settings_store::SettingsStore;
use crate::persistence::repository::{BaselineRepository, SampleRepository};

pub struct AppState {
    pub pipeline: Arc<EnergyPipeline>,
    pub samples: SampleRepository,
    pub baselines: BaselineRepository,
    pub settings: Arc<SettingsStore>,
    pub alerts: Arc<AlertStore>,
    pub analytics: Arc<AnalyticsStore>,
    pub broadcaster: Broadcaster,
}
