//! Energy pipeline orchestration: one poll cycle end to end.
//!
//! A cycle fetches from the gateway, anchors the day's baseline,
//! derives metrics, persists a sample, refreshes the latest-reading
//! cache, evaluates alerts, and broadcasts the result. Gateway fetches
//! are serialized behind a mutex so the on-demand endpoint can never
//! interleave a second login-then-query exchange with the periodic
//! poll.

use chrono::{Duration, Local, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::application::broadcast::{Broadcaster, Event, EventKind};
use crate::application::services::alert_store::AlertStore;
use crate::application::services::settings_store::SettingsStore;
use crate::domain::entities::reading::Reading;
use crate::domain::entities::sample::Sample;
use crate::domain::errors::PipelineError;
use crate::domain::providers::TemperatureProvider;
use crate::domain::services::{alert_rules, metrics};
use crate::infrastructure::gateway::GatewayClient;
use crate::persistence::repository::{BaselineRepository, SampleRepository};

pub struct EnergyPipeline {
    gateway: GatewayClient,
    fetch_lock: Mutex<()>,
    latest: RwLock<Option<Reading>>,
    samples: SampleRepository,
    baselines: BaselineRepository,
    settings: Arc<SettingsStore>,
    alerts: Arc<AlertStore>,
    temperature: Option<Arc<dyn TemperatureProvider>>,
    broadcaster: Broadcaster,
    /// Freshness window for the on-demand path.
    cache_max_age: Duration,
}

impl EnergyPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        gateway: GatewayClient,
        samples: SampleRepository,
        baselines: BaselineRepository,
        settings: Arc<SettingsStore>,
        alerts: Arc<AlertStore>,
        temperature: Option<Arc<dyn TemperatureProvider>>,
        broadcaster: Broadcaster,
        cache_max_age_secs: u64,
    ) -> Self {
        EnergyPipeline {
            gateway,
            fetch_lock: Mutex::new(()),
            latest: RwLock::new(None),
            samples,
            baselines,
            settings,
            alerts,
            temperature,
            broadcaster,
            cache_max_age: Duration::seconds(cache_max_age_secs as i64),
        }
    }

    /// Last successfully derived reading, if any.
    pub async fn latest_reading(&self) -> Option<Reading> {
        self.latest.read().await.clone()
    }

    /// On-demand poll with a short freshness cache. Requests queued
    /// behind an in-flight fetch reuse its result instead of issuing
    /// another gateway exchange.
    pub async fn poll_once(&self) -> Result<Reading, PipelineError> {
        let _guard = self.fetch_lock.lock().await;
        if let Some(reading) = self.fresh_reading().await {
            debug!("serving cached reading from {}", reading.timestamp);
            return Ok(reading);
        }
        self.run_cycle().await
    }

    /// Scheduled poll: always fetches, so the push stream keeps its
    /// cadence.
    pub async fn refresh(&self) -> Result<Reading, PipelineError> {
        let _guard = self.fetch_lock.lock().await;
        self.run_cycle().await
    }

    async fn fresh_reading(&self) -> Option<Reading> {
        let latest = self.latest.read().await;
        latest
            .as_ref()
            .filter(|r| Utc::now().signed_duration_since(r.timestamp) < self.cache_max_age)
            .cloned()
    }

    async fn run_cycle(&self) -> Result<Reading, PipelineError> {
        let raw = self.gateway.fetch().await?;

        // The baseline anchors day-to-date deltas at the first poll of
        // the local calendar day. When the store is unavailable the
        // current counters stand in, which degrades deltas to zero for
        // this cycle instead of failing it.
        let date_key = Local::now().format("%Y-%m-%d").to_string();
        let baseline = match self.baselines.get_or_insert(&date_key, &raw.counters).await {
            Ok(record) => record.counters(),
            Err(e) => {
                warn!("baseline unavailable for {}: {}", date_key, e);
                raw.counters
            }
        };

        let deltas = metrics::day_deltas(&raw.counters, &baseline);
        let instantaneous = metrics::self_powered_percent(raw.load_power, raw.grid_power);

        let reading = Reading {
            timestamp: raw.timestamp,
            solar_power: raw.solar_power,
            battery_power: raw.battery_power,
            grid_power: raw.grid_power,
            load_power: raw.load_power,
            battery_soe: raw.battery_soe,
            battery_status: metrics::battery_status(raw.battery_power),
            self_powered_pct: instantaneous,
            daily_self_powered_pct: metrics::daily_self_powered_percent(&deltas, instantaneous),
            daily_breakdown: metrics::daily_breakdown(&deltas),
            counters: raw.counters,
            grid_status: raw.grid_status,
            operation_mode: raw.operation_mode,
        };

        // The reading is still cached and broadcast when the durable
        // write fails; only this cycle's history row is lost.
        if let Err(e) = self.samples.insert(&Sample::from(&reading)).await {
            warn!("sample not persisted this cycle: {}", e);
        }

        *self.latest.write().await = Some(reading.clone());

        self.evaluate_alerts(&reading).await;
        self.broadcaster
            .publish(Event::new(EventKind::Powerwall, &reading));

        Ok(reading)
    }

    async fn evaluate_alerts(&self, reading: &Reading) {
        let settings = self.settings.snapshot().await;

        let inside_temp = match &self.temperature {
            Some(provider) => provider.inside_temperature_f().await,
            None => {
                debug!("no temperature provider configured; skipping temperature checks");
                None
            }
        };

        for candidate in alert_rules::evaluate(reading, inside_temp, &settings) {
            if let Some(alert) = self.alerts.raise(candidate).await {
                warn!("alert raised: {} ({})", alert.title, alert.id);
                self.broadcaster.publish(Event::new(EventKind::Alert, &alert));
            }
        }
    }
}
