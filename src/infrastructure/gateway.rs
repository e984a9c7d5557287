//! HTTP client for the local energy gateway.
//!
//! The gateway serves a small authenticated JSON API over HTTPS with a
//! self-signed certificate. Every fetch performs a login exchange for a
//! bearer token, then reads aggregate meter data and battery
//! state-of-energy in parallel; grid/operation status is a best-effort
//! secondary read that never fails the fetch.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::domain::entities::reading::CumulativeCounters;
use crate::domain::errors::PipelineError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway login rejected: {0}")]
    Auth(String),

    #[error("gateway returned {status} for {path}")]
    Status { path: String, status: u16 },
}

impl From<GatewayError> for PipelineError {
    fn from(err: GatewayError) -> Self {
        PipelineError::TransientFetch(err.to_string())
    }
}

/// Connection settings for the local gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL, e.g. `https://192.168.1.40`.
    pub base_url: String,
    pub email: String,
    pub password: String,
    pub timeout: Duration,
}

/// Raw-but-normalized result of one gateway fetch: integer watts, SOE
/// percent, and the cumulative counters. Day-to-date derivation happens
/// in the pipeline.
#[derive(Debug, Clone)]
pub struct GatewayReading {
    pub timestamp: DateTime<Utc>,
    pub solar_power: i64,
    pub battery_power: i64,
    pub grid_power: i64,
    pub load_power: i64,
    pub battery_soe: f64,
    pub counters: CumulativeCounters,
    pub grid_status: String,
    pub operation_mode: String,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
    force_sm_off: bool,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

/// One side of the aggregate meter: instantaneous power plus cumulative
/// energy counters since the gateway epoch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeterChannel {
    #[serde(default)]
    pub instant_power: f64,
    #[serde(default)]
    pub energy_exported: f64,
    #[serde(default)]
    pub energy_imported: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeterAggregates {
    #[serde(default)]
    pub site: MeterChannel,
    #[serde(default)]
    pub battery: MeterChannel,
    #[serde(default)]
    pub load: MeterChannel,
    #[serde(default)]
    pub solar: MeterChannel,
}

impl MeterAggregates {
    /// Map the meter channels onto the canonical counter set. `site` is
    /// the grid meter: imported energy flows from the utility.
    pub fn counters(&self) -> CumulativeCounters {
        CumulativeCounters {
            solar_exported_wh: self.solar.energy_exported,
            battery_exported_wh: self.battery.energy_exported,
            battery_imported_wh: self.battery.energy_imported,
            grid_imported_wh: self.site.energy_imported,
            grid_exported_wh: self.site.energy_exported,
            load_imported_wh: self.load.energy_imported,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SoeResponse {
    percentage: f64,
}

#[derive(Debug, Default, Deserialize)]
struct GridStatusResponse {
    #[serde(default)]
    grid_status: String,
}

#[derive(Debug, Default, Deserialize)]
struct OperationResponse {
    #[serde(default)]
    real_mode: String,
}

pub struct GatewayClient {
    client: Client,
    config: GatewayConfig,
}

impl GatewayClient {
    /// Build a client for the local gateway. The device presents a
    /// self-signed certificate, so certificate validation is disabled
    /// for this client only.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(GatewayClient { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn login(&self) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(self.url("/api/login/Basic"))
            .json(&LoginRequest {
                username: "customer",
                email: &self.config.email,
                password: &self.config.password,
                force_sm_off: false,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GatewayError::Auth(format!(
                "login returned {}",
                response.status()
            )));
        }

        let login: LoginResponse = response.json().await?;
        Ok(login.token)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
    ) -> Result<T, GatewayError> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GatewayError::Status {
                path: path.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response.json().await?)
    }

    /// Fetch and normalize one reading. Login or primary-read failure
    /// fails the fetch; the status reads default to empty instead.
    pub async fn fetch(&self) -> Result<GatewayReading, GatewayError> {
        let token = self.login().await?;

        let (aggregates, soe) = tokio::try_join!(
            self.get_json::<MeterAggregates>("/api/meters/aggregates", &token),
            self.get_json::<SoeResponse>("/api/system_status/soe", &token),
        )?;

        let (grid_status, operation) = tokio::join!(
            self.get_json::<GridStatusResponse>("/api/system_status/grid_status", &token),
            self.get_json::<OperationResponse>("/api/operation", &token),
        );
        let grid_status = grid_status.unwrap_or_else(|e| {
            debug!("grid status read failed: {}", e);
            GridStatusResponse::default()
        });
        let operation = operation.unwrap_or_else(|e| {
            debug!("operation read failed: {}", e);
            OperationResponse::default()
        });

        Ok(GatewayReading {
            timestamp: Utc::now(),
            solar_power: aggregates.solar.instant_power.round() as i64,
            battery_power: aggregates.battery.instant_power.round() as i64,
            grid_power: aggregates.site.instant_power.round() as i64,
            load_power: aggregates.load.instant_power.round() as i64,
            battery_soe: (soe.percentage * 10.0).round() / 10.0,
            counters: aggregates.counters(),
            grid_status: grid_status.grid_status,
            operation_mode: operation.real_mode,
        })
    }
}
