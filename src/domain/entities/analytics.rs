//! Hourly statistical summaries aggregated from persisted samples.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Grid power statistics over one hour, plus how many samples the
/// window held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridHourStats {
    pub avg: f64,
    pub max: f64,
    pub min: f64,
    pub samples: usize,
}

/// Power statistics plus integrated energy for a producing/consuming
/// channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyHourStats {
    pub avg: f64,
    pub max: f64,
    pub min: f64,
    pub total_kwh: f64,
}

/// Battery state-of-energy statistics over one hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoeHourStats {
    pub avg_soe: f64,
    pub max_soe: f64,
    pub min_soe: f64,
}

/// One hourly roll-up entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEntry {
    /// Start of the hour the entry summarizes.
    pub hour: DateTime<Utc>,
    pub grid: GridHourStats,
    pub solar: EnergyHourStats,
    pub load: EnergyHourStats,
    pub battery: SoeHourStats,
}
