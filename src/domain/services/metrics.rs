//! Normalization and derived self-consumption metrics.
//!
//! All functions here are pure: a value in, a classification or derived
//! value out, no hysteresis and no hidden state.

use crate::domain::entities::reading::{
    BatteryStatus, CumulativeCounters, DailyBreakdown, DayDeltas,
};

/// Dead-band around zero battery power, watts. Readings inside the band
/// (boundary inclusive) classify as standby.
pub const BATTERY_DEADBAND_W: i64 = 10;

/// Divisor converting raw cumulative meter units to kWh for display.
/// The counters are watt-hours stored as raw meter units; this scale
/// factor is kept as-is for compatibility with recorded history.
const KWH_DIVISOR: f64 = 1e6;

/// Classify battery flow from instantaneous battery power.
pub fn battery_status(battery_w: i64) -> BatteryStatus {
    if battery_w > BATTERY_DEADBAND_W {
        BatteryStatus::Discharging
    } else if battery_w < -BATTERY_DEADBAND_W {
        BatteryStatus::Charging
    } else {
        BatteryStatus::Standby
    }
}

/// Instantaneous share of load power not supplied by grid import.
///
/// Zero when there is no load; otherwise only positive grid power counts
/// as grid-supplied (negative grid power is export). Clamped to 0-100.
pub fn self_powered_percent(load_w: i64, grid_w: i64) -> i64 {
    if load_w <= 0 {
        return 0;
    }
    let load = load_w as f64;
    let grid_supplied = grid_w.max(0) as f64;
    (((load - grid_supplied) / load * 100.0).round() as i64).clamp(0, 100)
}

/// Day-to-date energy per channel: cumulative counter minus the day's
/// baseline. Clamped at zero so a counter that glitches below the
/// baseline can never invert to negative energy.
pub fn day_deltas(now: &CumulativeCounters, baseline: &CumulativeCounters) -> DayDeltas {
    DayDeltas {
        solar_wh: (now.solar_exported_wh - baseline.solar_exported_wh).max(0.0),
        battery_wh: (now.battery_exported_wh - baseline.battery_exported_wh).max(0.0),
        grid_wh: (now.grid_imported_wh - baseline.grid_imported_wh).max(0.0),
        load_wh: (now.load_imported_wh - baseline.load_imported_wh).max(0.0),
    }
}

fn kwh_display(wh: f64) -> String {
    format!("{:.1}", wh / KWH_DIVISOR)
}

/// Share of today's load supplied by each channel, with per-channel kWh
/// formatted to one decimal. All percentages are zero when the day has
/// no load yet.
pub fn daily_breakdown(deltas: &DayDeltas) -> DailyBreakdown {
    let pct = |wh: f64| {
        if deltas.load_wh > 0.0 {
            (wh / deltas.load_wh * 100.0).round() as i64
        } else {
            0
        }
    };

    DailyBreakdown {
        solar_pct: pct(deltas.solar_wh),
        battery_pct: pct(deltas.battery_wh),
        grid_pct: pct(deltas.grid_wh),
        solar_kwh: kwh_display(deltas.solar_wh),
        battery_kwh: kwh_display(deltas.battery_wh),
        grid_kwh: kwh_display(deltas.grid_wh),
        load_kwh: kwh_display(deltas.load_wh),
    }
}

/// Day-to-date self-powered percentage. Falls back to the instantaneous
/// value until the day has accumulated load.
pub fn daily_self_powered_percent(deltas: &DayDeltas, instantaneous_pct: i64) -> i64 {
    if deltas.load_wh > 0.0 {
        (((deltas.solar_wh + deltas.battery_wh) / deltas.load_wh * 100.0).round() as i64)
            .clamp(0, 100)
    } else {
        instantaneous_pct
    }
}
