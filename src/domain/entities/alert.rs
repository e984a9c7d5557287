//! Threshold alerts raised against the latest reading.
//!
//! `id` identifies the alert *kind* (e.g. "battery-low"), not an
//! occurrence: the active alert list is a set keyed by id, and a kind
//! stays raised until it is cleared explicitly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Fixed identifier per alert kind.
    pub id: String,
    /// Category the kind belongs to ("battery", "grid", "load",
    /// "temperature").
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    pub fn new(
        id: &str,
        kind: &str,
        severity: AlertSeverity,
        title: &str,
        message: String,
    ) -> Self {
        Alert {
            id: id.to_string(),
            kind: kind.to_string(),
            severity,
            title: title.to_string(),
            message,
            timestamp: Utc::now(),
        }
    }
}
