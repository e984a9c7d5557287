//! Optional inside-temperature source for the temperature alert rules.
//!
//! A thin pass-through fetcher with a short time-boxed cache. Any
//! failure yields `None`, which simply skips the temperature checks for
//! that evaluation.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::providers::TemperatureProvider;

const CACHE_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TemperatureResponse {
    temperature: f64,
}

pub struct HttpTemperatureProvider {
    client: Client,
    url: String,
    cached: RwLock<Option<(Instant, f64)>>,
}

impl HttpTemperatureProvider {
    pub fn new(url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpTemperatureProvider {
            client,
            url,
            cached: RwLock::new(None),
        })
    }

    async fn fetch(&self) -> Option<f64> {
        let response = match self.client.get(&self.url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("temperature fetch failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            debug!("temperature endpoint returned {}", response.status());
            return None;
        }

        match response.json::<TemperatureResponse>().await {
            Ok(body) => Some(body.temperature),
            Err(e) => {
                debug!("temperature response unreadable: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl TemperatureProvider for HttpTemperatureProvider {
    async fn inside_temperature_f(&self) -> Option<f64> {
        {
            let cached = self.cached.read().await;
            if let Some((at, value)) = *cached {
                if at.elapsed() < CACHE_TTL {
                    return Some(value);
                }
            }
        }

        let value = self.fetch().await?;
        *self.cached.write().await = Some((Instant::now(), value));
        Some(value)
    }
}
