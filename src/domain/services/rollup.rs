//! Hourly analytics roll-up over persisted samples.

use chrono::{DateTime, Utc};

use crate::domain::entities::analytics::{
    AnalyticsEntry, EnergyHourStats, GridHourStats, SoeHourStats,
};
use crate::domain::entities::sample::Sample;

/// Integrate energy over the window as a plain Riemann sum with one
/// evaluation per poll: `Σ(power_w / 3600 / 1000)` kWh. Over- or
/// under-estimates when the poll interval is irregular; the formula is
/// kept verbatim so entries stay comparable with recorded history.
fn total_kwh<F: Fn(&Sample) -> f64>(samples: &[Sample], channel: F) -> f64 {
    samples.iter().map(|s| channel(s) / 3600.0 / 1000.0).sum()
}

fn stats<F: Fn(&Sample) -> f64>(samples: &[Sample], channel: F) -> (f64, f64, f64) {
    let mut sum = 0.0;
    let mut max = f64::MIN;
    let mut min = f64::MAX;
    for sample in samples {
        let value = channel(sample);
        sum += value;
        max = max.max(value);
        min = min.min(value);
    }
    (sum / samples.len() as f64, max, min)
}

/// Summarize the samples of one hour, or `None` when the window is
/// empty (no entry is written and nothing is broadcast).
pub fn rollup_hour(samples: &[Sample], hour: DateTime<Utc>) -> Option<AnalyticsEntry> {
    if samples.is_empty() {
        return None;
    }

    let (grid_avg, grid_max, grid_min) = stats(samples, |s| s.grid_w as f64);
    let (solar_avg, solar_max, solar_min) = stats(samples, |s| s.solar_w as f64);
    let (load_avg, load_max, load_min) = stats(samples, |s| s.load_w as f64);
    let (soe_avg, soe_max, soe_min) = stats(samples, |s| s.battery_soe);

    Some(AnalyticsEntry {
        hour,
        grid: GridHourStats {
            avg: grid_avg,
            max: grid_max,
            min: grid_min,
            samples: samples.len(),
        },
        solar: EnergyHourStats {
            avg: solar_avg,
            max: solar_max,
            min: solar_min,
            total_kwh: total_kwh(samples, |s| s.solar_w as f64),
        },
        load: EnergyHourStats {
            avg: load_avg,
            max: load_max,
            min: load_min,
            total_kwh: total_kwh(samples, |s| s.load_w as f64),
        },
        battery: SoeHourStats {
            avg_soe: soe_avg,
            max_soe: soe_max,
            min_soe: soe_min,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::reading::BatteryStatus;
    use chrono::Duration;

    fn sample(solar_w: i64, grid_w: i64, load_w: i64, soe: f64) -> Sample {
        Sample {
            timestamp: Utc::now(),
            solar_w,
            battery_w: 0,
            grid_w,
            load_w,
            battery_soe: soe,
            battery_status: BatteryStatus::Standby,
        }
    }

    #[test]
    fn test_empty_window_produces_nothing() {
        assert!(rollup_hour(&[], Utc::now()).is_none());
    }

    #[test]
    fn test_single_sample() {
        let hour = Utc::now() - Duration::hours(1);
        let entry = rollup_hour(&[sample(3600, 100, 1200, 80.0)], hour).unwrap();

        assert_eq!(entry.hour, hour);
        assert_eq!(entry.grid.samples, 1);
        assert_eq!(entry.grid.avg, 100.0);
        assert_eq!(entry.grid.max, 100.0);
        assert_eq!(entry.grid.min, 100.0);
        // 3600 W over one nominal second: 0.001 kWh.
        assert!((entry.solar.total_kwh - 0.001).abs() < 1e-12);
        assert_eq!(entry.battery.avg_soe, 80.0);
    }

    #[test]
    fn test_stats_over_window() {
        let samples = vec![
            sample(1000, -500, 800, 90.0),
            sample(2000, 0, 1000, 85.0),
            sample(3000, 500, 1200, 80.0),
        ];
        let entry = rollup_hour(&samples, Utc::now()).unwrap();

        assert_eq!(entry.grid.avg, 0.0);
        assert_eq!(entry.grid.max, 500.0);
        assert_eq!(entry.grid.min, -500.0);
        assert_eq!(entry.grid.samples, 3);

        assert_eq!(entry.solar.avg, 2000.0);
        assert_eq!(entry.solar.max, 3000.0);
        assert_eq!(entry.solar.min, 1000.0);
        // Riemann sum: (1000 + 2000 + 3000) / 3_600_000.
        assert!((entry.solar.total_kwh - 6000.0 / 3_600_000.0).abs() < 1e-12);

        assert_eq!(entry.load.avg, 1000.0);
        assert_eq!(entry.battery.avg_soe, 85.0);
        assert_eq!(entry.battery.max_soe, 90.0);
        assert_eq!(entry.battery.min_soe, 80.0);
    }
}
