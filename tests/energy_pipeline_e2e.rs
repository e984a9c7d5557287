//! Energy pipeline end-to-end tests against an in-memory database:
//! baseline anchoring and day-to-date derivation, sample persistence
//! feeding the hourly roll-up, alert de-duplication through the store,
//! and broadcast delivery of the resulting events.

use chrono::{Duration, Utc};
use std::sync::Arc;

use hearth::application::broadcast::{Broadcaster, Event, EventKind};
use hearth::application::services::alert_store::AlertStore;
use hearth::application::services::analytics_store::AnalyticsStore;
use hearth::application::services::settings_store::SettingsStore;
use hearth::domain::entities::reading::{BatteryStatus, CumulativeCounters, Reading};
use hearth::domain::entities::sample::Sample;
use hearth::domain::entities::settings::Settings;
use hearth::domain::services::{alert_rules, metrics, rollup};
use hearth::persistence::documents::DocumentStore;
use hearth::persistence::repository::{BaselineRepository, SampleRepository};
use hearth::persistence::{init_database, DbPool};

async fn pool() -> DbPool {
    init_database("sqlite::memory:").await.unwrap()
}

/// Build a reading the way the pipeline does: baseline lookup, day
/// deltas, then the derived metrics.
async fn derive_reading(
    baselines: &BaselineRepository,
    date: &str,
    counters: CumulativeCounters,
    solar_w: i64,
    battery_w: i64,
    grid_w: i64,
    load_w: i64,
    battery_soe: f64,
) -> Reading {
    let baseline = baselines
        .get_or_insert(date, &counters)
        .await
        .unwrap()
        .counters();
    let deltas = metrics::day_deltas(&counters, &baseline);
    let instantaneous = metrics::self_powered_percent(load_w, grid_w);

    Reading {
        timestamp: Utc::now(),
        solar_power: solar_w,
        battery_power: battery_w,
        grid_power: grid_w,
        load_power: load_w,
        battery_soe,
        battery_status: metrics::battery_status(battery_w),
        self_powered_pct: instantaneous,
        daily_self_powered_pct: metrics::daily_self_powered_percent(&deltas, instantaneous),
        daily_breakdown: metrics::daily_breakdown(&deltas),
        counters,
        grid_status: String::new(),
        operation_mode: String::new(),
    }
}

#[tokio::test]
async fn day_derivation_uses_first_poll_as_baseline() {
    let pool = pool().await;
    let baselines = BaselineRepository::new(pool);

    let first = CumulativeCounters {
        solar_exported_wh: 1_000_000.0,
        load_imported_wh: 2_000_000.0,
        ..Default::default()
    };
    let reading = derive_reading(&baselines, "2026-08-06", first, 2000, 0, 100, 1500, 80.0).await;

    // First poll of the day: deltas are zero, daily falls back to the
    // instantaneous value.
    assert_eq!(reading.daily_breakdown.solar_kwh, "0.0");
    assert_eq!(reading.self_powered_pct, 93);
    assert_eq!(reading.daily_self_powered_pct, 93);

    let later = CumulativeCounters {
        solar_exported_wh: 1_500_000.0,
        load_imported_wh: 2_800_000.0,
        ..Default::default()
    };
    let reading = derive_reading(&baselines, "2026-08-06", later, 2000, 0, 100, 1500, 80.0).await;

    assert_eq!(reading.daily_breakdown.solar_kwh, "0.5");
    assert_eq!(reading.daily_breakdown.solar_pct, 63);
    assert_eq!(reading.daily_breakdown.load_kwh, "0.8");
    assert_eq!(reading.daily_self_powered_pct, 63);
}

#[tokio::test]
async fn samples_feed_the_hourly_rollup() {
    let pool = pool().await;
    let samples = SampleRepository::new(pool.clone());
    let analytics = AnalyticsStore::load(DocumentStore::new(pool)).await;

    let now = Utc::now();
    for (minutes_ago, solar_w) in [(50, 1000), (30, 2000), (10, 3000)] {
        samples
            .insert(&Sample {
                timestamp: now - Duration::minutes(minutes_ago),
                solar_w,
                battery_w: 0,
                grid_w: 250,
                load_w: 1800,
                battery_soe: 75.0,
                battery_status: BatteryStatus::Standby,
            })
            .await
            .unwrap();
    }
    // Outside the window; must not contribute.
    samples
        .insert(&Sample {
            timestamp: now - Duration::minutes(90),
            solar_w: 9000,
            battery_w: 0,
            grid_w: 0,
            load_w: 0,
            battery_soe: 75.0,
            battery_status: BatteryStatus::Standby,
        })
        .await
        .unwrap();

    let window = samples
        .between(now - Duration::hours(1), now)
        .await
        .unwrap();
    let entry = rollup::rollup_hour(&window, now - Duration::hours(1)).unwrap();

    assert_eq!(entry.grid.samples, 3);
    assert_eq!(entry.solar.avg, 2000.0);
    assert_eq!(entry.solar.max, 3000.0);
    assert!((entry.solar.total_kwh - 6000.0 / 3_600_000.0).abs() < 1e-12);

    analytics.push(entry).await;
    assert_eq!(analytics.since(now - Duration::hours(2)).await.len(), 1);
}

#[tokio::test]
async fn rollup_of_empty_window_writes_nothing() {
    let pool = pool().await;
    let samples = SampleRepository::new(pool);

    let now = Utc::now();
    let window = samples
        .between(now - Duration::hours(1), now)
        .await
        .unwrap();

    assert!(rollup::rollup_hour(&window, now).is_none());
}

#[tokio::test]
async fn breach_alerts_deduplicate_until_cleared() {
    let pool = pool().await;
    let baselines = BaselineRepository::new(pool.clone());
    let alerts = AlertStore::load(DocumentStore::new(pool.clone())).await;
    let settings = SettingsStore::load(DocumentStore::new(pool)).await;

    let broadcaster = Broadcaster::new(16);
    let mut rx = broadcaster.subscribe();

    // Battery at 12% breaches the default low threshold on every poll.
    let reading = derive_reading(
        &baselines,
        "2026-08-06",
        CumulativeCounters::default(),
        0,
        -5,
        400,
        900,
        12.0,
    )
    .await;

    let snapshot = settings.snapshot().await;
    for _ in 0..3 {
        for candidate in alert_rules::evaluate(&reading, None, &snapshot) {
            if let Some(alert) = alerts.raise(candidate).await {
                broadcaster.publish(Event::new(EventKind::Alert, &alert));
            }
        }
    }

    // Three identical breaches: one persisted alert, one broadcast.
    let active = alerts.list(10).await;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, "battery-low");

    let event = rx.recv().await.unwrap();
    assert_eq!(event.kind, EventKind::Alert);
    assert_eq!(event.data["id"], "battery-low");
    assert!(rx.try_recv().is_err());

    // Clearing re-arms the kind.
    assert!(alerts.clear("battery-low").await);
    for candidate in alert_rules::evaluate(&reading, None, &snapshot) {
        alerts.raise(candidate).await;
    }
    assert_eq!(alerts.list(10).await.len(), 1);
}

#[tokio::test]
async fn settings_update_changes_evaluation() {
    let pool = pool().await;
    let settings = SettingsStore::load(DocumentStore::new(pool.clone())).await;
    let baselines = BaselineRepository::new(pool);

    let reading = derive_reading(
        &baselines,
        "2026-08-06",
        CumulativeCounters::default(),
        0,
        0,
        500,
        5000,
        50.0,
    )
    .await;

    // 5 kW load is under the default threshold.
    let candidates = alert_rules::evaluate(&reading, None, &settings.snapshot().await);
    assert!(candidates.is_empty());

    settings
        .update(Settings {
            high_load_watts: 4000.0,
            ..Settings::default()
        })
        .await
        .unwrap();

    let candidates = alert_rules::evaluate(&reading, None, &settings.snapshot().await);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].id, "high-load");
}

#[tokio::test]
async fn reading_events_carry_the_wire_shape() {
    let pool = pool().await;
    let baselines = BaselineRepository::new(pool);

    let broadcaster = Broadcaster::new(16);
    let mut rx = broadcaster.subscribe();

    let reading = derive_reading(
        &baselines,
        "2026-08-06",
        CumulativeCounters::default(),
        3200,
        -1500,
        -20,
        990,
        64.5,
    )
    .await;
    broadcaster.publish(Event::new(EventKind::Powerwall, &reading));

    let event = rx.recv().await.unwrap();
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "powerwall");
    assert_eq!(json["data"]["solarPower"], 3200);
    assert_eq!(json["data"]["batteryStatus"], "charging");
    // Exporting grid supplies none of the load.
    assert_eq!(json["data"]["selfPoweredPct"], 100);
}
