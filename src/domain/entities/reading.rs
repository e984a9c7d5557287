//! Canonical energy reading produced by one poll of the gateway.
//!
//! A `Reading` is immutable once built; a new poll replaces the cached
//! latest value wholesale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Battery flow classification derived from instantaneous battery power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatteryStatus {
    Charging,
    Discharging,
    Standby,
}

impl BatteryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatteryStatus::Charging => "charging",
            BatteryStatus::Discharging => "discharging",
            BatteryStatus::Standby => "standby",
        }
    }
}

impl std::str::FromStr for BatteryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "charging" => Ok(BatteryStatus::Charging),
            "discharging" => Ok(BatteryStatus::Discharging),
            "standby" => Ok(BatteryStatus::Standby),
            other => Err(format!("unknown battery status: {}", other)),
        }
    }
}

/// Cumulative imported/exported energy counters since the gateway epoch,
/// in raw meter units (watt-hour based).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CumulativeCounters {
    pub solar_exported_wh: f64,
    pub battery_exported_wh: f64,
    pub battery_imported_wh: f64,
    pub grid_imported_wh: f64,
    pub grid_exported_wh: f64,
    pub load_imported_wh: f64,
}

/// Day-to-date energy per channel: cumulative counter minus that day's
/// baseline, clamped at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DayDeltas {
    pub solar_wh: f64,
    pub battery_wh: f64,
    pub grid_wh: f64,
    pub load_wh: f64,
}

/// Share of today's load supplied by each channel, plus per-channel kWh
/// formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBreakdown {
    pub solar_pct: i64,
    pub battery_pct: i64,
    pub grid_pct: i64,
    pub solar_kwh: String,
    pub battery_kwh: String,
    pub grid_kwh: String,
    pub load_kwh: String,
}

/// One normalized poll of the energy gateway with all derived fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    /// Instantaneous power in integer watts. Positive grid power imports
    /// from the utility, negative exports.
    pub solar_power: i64,
    pub battery_power: i64,
    pub grid_power: i64,
    pub load_power: i64,
    /// Battery state-of-energy, percent.
    pub battery_soe: f64,
    pub battery_status: BatteryStatus,
    /// Instantaneous share of load not supplied by grid import, 0-100.
    pub self_powered_pct: i64,
    /// Day-to-date self-powered percentage, 0-100.
    pub daily_self_powered_pct: i64,
    pub daily_breakdown: DailyBreakdown,
    pub counters: CumulativeCounters,
    /// Best-effort status fields; empty when the secondary gateway read
    /// fails.
    #[serde(default)]
    pub grid_status: String,
    #[serde(default)]
    pub operation_mode: String,
}
