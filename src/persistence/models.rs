//! Database Models
//!
//! Row types for the samples and baselines tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::domain::entities::reading::{BatteryStatus, CumulativeCounters};
use crate::domain::entities::sample::Sample;

/// Sample row in database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SampleRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub solar_w: i64,
    pub battery_w: i64,
    pub grid_w: i64,
    pub load_w: i64,
    pub battery_soe: f64,
    pub battery_status: String,
}

impl From<SampleRecord> for Sample {
    fn from(record: SampleRecord) -> Self {
        Sample {
            timestamp: record.timestamp,
            solar_w: record.solar_w,
            battery_w: record.battery_w,
            grid_w: record.grid_w,
            load_w: record.load_w,
            battery_soe: record.battery_soe,
            // The column is CHECK-constrained to the three known values.
            battery_status: record
                .battery_status
                .parse()
                .unwrap_or(BatteryStatus::Standby),
        }
    }
}

/// Baseline row in database: the cumulative counters at the first poll
/// of a calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BaselineRecord {
    pub date: String,
    pub solar_exported_wh: f64,
    pub battery_exported_wh: f64,
    pub battery_imported_wh: f64,
    pub grid_imported_wh: f64,
    pub grid_exported_wh: f64,
    pub load_imported_wh: f64,
    pub created_at: DateTime<Utc>,
}

impl BaselineRecord {
    pub fn counters(&self) -> CumulativeCounters {
        CumulativeCounters {
            solar_exported_wh: self.solar_exported_wh,
            battery_exported_wh: self.battery_exported_wh,
            battery_imported_wh: self.battery_imported_wh,
            grid_imported_wh: self.grid_imported_wh,
            grid_exported_wh: self.grid_exported_wh,
            load_imported_wh: self.load_imported_wh,
        }
    }
}
