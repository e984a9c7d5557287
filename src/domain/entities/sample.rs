//! Persisted time-series sample, one row per successful poll.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::reading::{BatteryStatus, Reading};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub solar_w: i64,
    pub battery_w: i64,
    pub grid_w: i64,
    pub load_w: i64,
    pub battery_soe: f64,
    pub battery_status: BatteryStatus,
}

impl From<&Reading> for Sample {
    fn from(reading: &Reading) -> Self {
        Sample {
            timestamp: reading.timestamp,
            solar_w: reading.solar_power,
            battery_w: reading.battery_power,
            grid_w: reading.grid_power,
            load_w: reading.load_power,
            battery_soe: reading.battery_soe,
            battery_status: reading.battery_status,
        }
    }
}
