//! Dashboard settings: alert thresholds plus display preferences.
//!
//! Mutable only through the admin update path; the alert engine reads a
//! snapshot on every evaluation. Fields are independent thresholds, so
//! no multi-field atomicity is required.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Raise `battery-low` when state-of-energy falls to this percent.
    pub battery_low_pct: f64,
    /// Raise `battery-high` when state-of-energy reaches this percent.
    pub battery_high_pct: f64,
    /// Enable the `grid-down` check.
    pub grid_down_alert: bool,
    /// Raise `high-load` at or above this many watts.
    pub high_load_watts: f64,
    /// Inside temperature thresholds, °F.
    pub high_temp_f: f64,
    pub low_temp_f: f64,

    // Display preferences for the wall clients.
    pub theme: String,
    pub temperature_unit: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            battery_low_pct: 20.0,
            battery_high_pct: 95.0,
            grid_down_alert: true,
            high_load_watts: 8000.0,
            high_temp_f: 85.0,
            low_temp_f: 55.0,
            theme: "dark".to_string(),
            temperature_unit: "F".to_string(),
        }
    }
}
