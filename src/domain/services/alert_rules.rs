//! Stateless threshold evaluation against the latest reading.
//!
//! Each rule produces a candidate alert with a fixed per-kind id; the
//! alert store decides whether a candidate is actually raised (an id
//! that is already active is suppressed until cleared).

use crate::domain::entities::alert::{Alert, AlertSeverity};
use crate::domain::entities::reading::Reading;
use crate::domain::entities::settings::Settings;

pub const BATTERY_LOW: &str = "battery-low";
pub const BATTERY_HIGH: &str = "battery-high";
pub const GRID_DOWN: &str = "grid-down";
pub const HIGH_LOAD: &str = "high-load";
pub const HIGH_TEMP: &str = "high-temp";
pub const LOW_TEMP: &str = "low-temp";

/// Evaluate every rule, returning zero or more candidate alerts.
///
/// Temperature rules require an inside temperature reading and are
/// skipped when none is available.
pub fn evaluate(reading: &Reading, inside_temp_f: Option<f64>, settings: &Settings) -> Vec<Alert> {
    let mut candidates = Vec::new();

    if reading.battery_soe <= settings.battery_low_pct {
        candidates.push(Alert::new(
            BATTERY_LOW,
            "battery",
            AlertSeverity::High,
            "Battery Low",
            format!(
                "Battery at {:.0}% (threshold {:.0}%)",
                reading.battery_soe, settings.battery_low_pct
            ),
        ));
    }

    if reading.battery_soe >= settings.battery_high_pct {
        candidates.push(Alert::new(
            BATTERY_HIGH,
            "battery",
            AlertSeverity::Low,
            "Battery Full",
            format!(
                "Battery at {:.0}% (threshold {:.0}%)",
                reading.battery_soe, settings.battery_high_pct
            ),
        ));
    }

    // Grid power at or below zero means nothing is being imported, which
    // is the gateway-visible signature of an outage.
    if settings.grid_down_alert && reading.grid_power <= 0 {
        candidates.push(Alert::new(
            GRID_DOWN,
            "grid",
            AlertSeverity::Critical,
            "Grid Down",
            format!("Grid power at {} W", reading.grid_power),
        ));
    }

    if reading.load_power as f64 >= settings.high_load_watts {
        candidates.push(Alert::new(
            HIGH_LOAD,
            "load",
            AlertSeverity::Medium,
            "High Load",
            format!(
                "Home load at {} W (threshold {:.0} W)",
                reading.load_power, settings.high_load_watts
            ),
        ));
    }

    if let Some(temp) = inside_temp_f {
        if temp >= settings.high_temp_f {
            candidates.push(Alert::new(
                HIGH_TEMP,
                "temperature",
                AlertSeverity::High,
                "High Temperature",
                format!(
                    "Inside temperature {:.1}°F (threshold {:.0}°F)",
                    temp, settings.high_temp_f
                ),
            ));
        }
        if temp <= settings.low_temp_f {
            candidates.push(Alert::new(
                LOW_TEMP,
                "temperature",
                AlertSeverity::Medium,
                "Low Temperature",
                format!(
                    "Inside temperature {:.1}°F (threshold {:.0}°F)",
                    temp, settings.low_temp_f
                ),
            ));
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::reading::{BatteryStatus, CumulativeCounters, DailyBreakdown};
    use chrono::Utc;

    fn reading(battery_soe: f64, grid_power: i64, load_power: i64) -> Reading {
        Reading {
            timestamp: Utc::now(),
            solar_power: 0,
            battery_power: 0,
            grid_power,
            load_power,
            battery_soe,
            battery_status: BatteryStatus::Standby,
            self_powered_pct: 0,
            daily_self_powered_pct: 0,
            daily_breakdown: DailyBreakdown {
                solar_pct: 0,
                battery_pct: 0,
                grid_pct: 0,
                solar_kwh: "0.0".into(),
                battery_kwh: "0.0".into(),
                grid_kwh: "0.0".into(),
                load_kwh: "0.0".into(),
            },
            counters: CumulativeCounters::default(),
            grid_status: String::new(),
            operation_mode: String::new(),
        }
    }

    fn ids(alerts: &[Alert]) -> Vec<&str> {
        alerts.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_battery_low() {
        let alerts = evaluate(&reading(15.0, 500, 1000), None, &Settings::default());
        assert_eq!(ids(&alerts), vec![BATTERY_LOW]);
        assert_eq!(alerts[0].severity, AlertSeverity::High);
    }

    #[test]
    fn test_battery_low_boundary_inclusive() {
        let alerts = evaluate(&reading(20.0, 500, 1000), None, &Settings::default());
        assert_eq!(ids(&alerts), vec![BATTERY_LOW]);
    }

    #[test]
    fn test_battery_high() {
        let alerts = evaluate(&reading(96.0, 500, 1000), None, &Settings::default());
        assert_eq!(ids(&alerts), vec![BATTERY_HIGH]);
        assert_eq!(alerts[0].severity, AlertSeverity::Low);
    }

    #[test]
    fn test_grid_down() {
        let alerts = evaluate(&reading(50.0, 0, 1000), None, &Settings::default());
        assert_eq!(ids(&alerts), vec![GRID_DOWN]);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
    }

    #[test]
    fn test_grid_down_disabled() {
        let settings = Settings {
            grid_down_alert: false,
            ..Settings::default()
        };
        let alerts = evaluate(&reading(50.0, -200, 1000), None, &settings);
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_high_load() {
        let alerts = evaluate(&reading(50.0, 500, 9000), None, &Settings::default());
        assert_eq!(ids(&alerts), vec![HIGH_LOAD]);
        assert_eq!(alerts[0].severity, AlertSeverity::Medium);
    }

    #[test]
    fn test_temperature_rules_need_a_reading() {
        let alerts = evaluate(&reading(50.0, 500, 1000), None, &Settings::default());
        assert!(alerts.is_empty());

        let alerts = evaluate(&reading(50.0, 500, 1000), Some(90.0), &Settings::default());
        assert_eq!(ids(&alerts), vec![HIGH_TEMP]);

        let alerts = evaluate(&reading(50.0, 500, 1000), Some(40.0), &Settings::default());
        assert_eq!(ids(&alerts), vec![LOW_TEMP]);
        assert_eq!(alerts[0].severity, AlertSeverity::Medium);
    }

    #[test]
    fn test_multiple_breaches_yield_multiple_candidates() {
        let alerts = evaluate(&reading(10.0, 0, 9000), Some(90.0), &Settings::default());
        assert_eq!(ids(&alerts), vec![BATTERY_LOW, GRID_DOWN, HIGH_LOAD, HIGH_TEMP]);
    }
}
