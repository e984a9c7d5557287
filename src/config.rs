use std::time::Duration;

/// Runtime configuration for the dashboard backend
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Port the HTTP server listens on
    pub http_port: u16,
    /// SQLite database URL
    pub database_url: String,

    // Local energy gateway
    pub gateway_url: String,
    pub gateway_email: String,
    pub gateway_password: String,
    pub gateway_timeout_secs: u64,

    /// Periodic poll cadence while at least one live view is connected
    pub poll_interval_secs: u64,
    /// Freshness window for the on-demand energy endpoint
    pub on_demand_cache_secs: u64,
    /// Analytics roll-up cadence
    pub rollup_interval_secs: u64,
    /// Sample history retention
    pub sample_retention_days: u32,
    /// Broadcast channel capacity per subscriber
    pub broadcast_capacity: usize,

    /// Optional inside-temperature endpoint for the temperature alerts
    pub temperature_url: Option<String>,
}

impl DashboardConfig {
    /// Default configuration for a gateway on the local network
    pub fn default() -> DashboardConfig {
        DashboardConfig {
            http_port: 3000,
            database_url: "sqlite://data/hearth.db".to_string(),
            gateway_url: "https://192.168.91.1".to_string(),
            gateway_email: String::new(),
            gateway_password: String::new(),
            gateway_timeout_secs: 5,
            poll_interval_secs: 10,
            on_demand_cache_secs: 15,
            rollup_interval_secs: 3600,
            sample_retention_days: 30,
            broadcast_capacity: 100,
            temperature_url: None,
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> DashboardConfig {
        let mut config = DashboardConfig::default();

        if let Ok(port) = std::env::var("HTTP_PORT") {
            match port.parse::<u16>() {
                Ok(value) if value > 0 => config.http_port = value,
                _ => {
                    tracing::warn!(
                        "Invalid HTTP_PORT value: {}, using default: {}",
                        port,
                        config.http_port
                    );
                }
            }
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.is_empty() {
                config.database_url = url;
            }
        }

        if let Ok(url) = std::env::var("GATEWAY_URL") {
            if !url.is_empty() {
                config.gateway_url = url;
            }
        }

        if let Ok(email) = std::env::var("GATEWAY_EMAIL") {
            config.gateway_email = email;
        }

        if let Ok(password) = std::env::var("GATEWAY_PASSWORD") {
            config.gateway_password = password;
        }

        if let Ok(timeout) = std::env::var("GATEWAY_TIMEOUT_SECS") {
            if let Ok(value) = timeout.parse::<u64>() {
                if (1..=30).contains(&value) {
                    config.gateway_timeout_secs = value;
                } else {
                    tracing::warn!(
                        "GATEWAY_TIMEOUT_SECS {} out of range (1-30), using default: {}",
                        value,
                        config.gateway_timeout_secs
                    );
                }
            }
        }

        if let Ok(interval) = std::env::var("POLL_INTERVAL_SECS") {
            if let Ok(value) = interval.parse::<u64>() {
                if (2..=300).contains(&value) {
                    config.poll_interval_secs = value;
                }
            }
        }

        if let Ok(cache) = std::env::var("ON_DEMAND_CACHE_SECS") {
            if let Ok(value) = cache.parse::<u64>() {
                if (1..=300).contains(&value) {
                    config.on_demand_cache_secs = value;
                }
            }
        }

        if let Ok(interval) = std::env::var("ROLLUP_INTERVAL_SECS") {
            if let Ok(value) = interval.parse::<u64>() {
                if (60..=86_400).contains(&value) {
                    config.rollup_interval_secs = value;
                }
            }
        }

        if let Ok(retention) = std::env::var("SAMPLE_RETENTION_DAYS") {
            if let Ok(value) = retention.parse::<u32>() {
                if (1..=365).contains(&value) {
                    config.sample_retention_days = value;
                }
            }
        }

        if let Ok(capacity) = std::env::var("BROADCAST_CAPACITY") {
            if let Ok(value) = capacity.parse::<usize>() {
                if (1..=10_000).contains(&value) {
                    config.broadcast_capacity = value;
                }
            }
        }

        if let Ok(url) = std::env::var("TEMPERATURE_URL") {
            if !url.is_empty() {
                config.temperature_url = Some(url);
            }
        }

        config
    }

    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway_timeout_secs)
    }
}
