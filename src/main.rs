mod application;
mod config;
mod domain;
mod infrastructure;
mod persistence;
mod task_runner;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get};
use axum::{Json, Router};
use chrono::{DurationRound, Utc};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::application::broadcast::{Broadcaster, Event, EventKind};
use crate::application::handlers::ws::ws_handler;
use crate::application::services::alert_store::AlertStore;
use crate::application::services::analytics_store::AnalyticsStore;
use crate::application::services::pipeline::EnergyPipeline;
use crate::application::services::settings_store::SettingsStore;
use crate::application::state::AppState;
use crate::config::DashboardConfig;
use crate::domain::entities::settings::Settings;
use crate::domain::providers::TemperatureProvider;
use crate::domain::services::rollup;
use crate::infrastructure::gateway::{GatewayClient, GatewayConfig};
use crate::infrastructure::temperature::HttpTemperatureProvider;
use crate::persistence::documents::DocumentStore;
use crate::persistence::repository::{BaselineRepository, SampleRepository};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hearth=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Hearth dashboard backend starting...");

    let config = DashboardConfig::from_env();

    let pool = persistence::init_database(&config.database_url).await?;
    let docs = DocumentStore::new(pool.clone());
    let samples = SampleRepository::new(pool.clone());
    let baselines = BaselineRepository::new(pool);

    let settings = Arc::new(SettingsStore::load(docs.clone()).await);
    let alerts = Arc::new(AlertStore::load(docs.clone()).await);
    let analytics = Arc::new(AnalyticsStore::load(docs).await);
    let broadcaster = Broadcaster::new(config.broadcast_capacity);

    let gateway = GatewayClient::new(GatewayConfig {
        base_url: config.gateway_url.clone(),
        email: config.gateway_email.clone(),
        password: config.gateway_password.clone(),
        timeout: config.gateway_timeout(),
    })?;
    info!("Energy gateway at {}", config.gateway_url);

    let temperature: Option<Arc<dyn TemperatureProvider>> = match &config.temperature_url {
        Some(url) => match HttpTemperatureProvider::new(url.clone(), config.gateway_timeout()) {
            Ok(provider) => Some(Arc::new(provider)),
            Err(e) => {
                warn!("Temperature provider unavailable: {}", e);
                None
            }
        },
        None => None,
    };
    if temperature.is_none() {
        info!("No temperature source configured; temperature alerts disabled");
    }

    let pipeline = Arc::new(EnergyPipeline::new(
        gateway,
        samples.clone(),
        baselines.clone(),
        settings.clone(),
        alerts.clone(),
        temperature,
        broadcaster.clone(),
        config.on_demand_cache_secs,
    ));

    let state = Arc::new(AppState {
        pipeline,
        samples,
        baselines,
        settings,
        alerts,
        analytics,
        broadcaster,
    });

    // Periodic gateway poll. The gateway is only polled while somebody
    // is watching; the on-demand endpoint covers everything else.
    let poll_state = state.clone();
    let poll_period = std::time::Duration::from_secs(config.poll_interval_secs);
    tokio::spawn(async move {
        task_runner::run_periodic("energy-poll", poll_period, move || {
            let state = poll_state.clone();
            async move {
                if state.broadcaster.subscriber_count() == 0 {
                    debug!("no live subscribers; skipping gateway poll");
                    return Ok(());
                }
                state
                    .pipeline
                    .refresh()
                    .await
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            }
        })
        .await;
    });

    // Hourly analytics roll-up plus retention trim, independent of
    // subscriber count.
    let rollup_state = state.clone();
    let rollup_period = std::time::Duration::from_secs(config.rollup_interval_secs);
    let retention_days = config.sample_retention_days;
    tokio::spawn(async move {
        task_runner::run_periodic("analytics-rollup", rollup_period, move || {
            let state = rollup_state.clone();
            async move { run_rollup(&state, retention_days).await }
        })
        .await;
    });

    let app = Router::new()
        .route("/", get(|| async { "Hearth dashboard backend is running!" }))
        .route("/health", get(health_check))
        .route("/api/energy", get(get_energy))
        .route("/api/energy/latest", get(get_latest_reading))
        .route("/api/energy/history", get(get_history))
        .route("/api/energy/analytics", get(get_analytics))
        .route("/api/energy/baselines", get(get_baselines))
        .route("/api/alerts", get(get_alerts))
        .route("/api/alerts/:id", delete(clear_alert))
        .route("/api/settings", get(get_settings).put(update_settings))
        .route("/ws", get(ws_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    let server = axum::serve(listener, app);

    let shutdown_signal = async move {
        let ctrl_c = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C signal"),
                Err(e) => error!("Failed to install Ctrl+C handler: {}", e),
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                    info!("Received SIGTERM signal");
                }
                Err(e) => error!("Failed to install SIGTERM handler: {}", e),
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    };

    info!("Server started successfully. Press Ctrl+C to stop.");
    server.with_graceful_shutdown(shutdown_signal).await?;

    info!("Shutdown complete");
    Ok(())
}

/// One analytics iteration: roll up the last hour of samples and trim
/// history past the retention window.
async fn run_rollup(state: &AppState, retention_days: u32) -> Result<(), String> {
    let now = Utc::now();

    let samples = state
        .samples
        .between(now - chrono::Duration::hours(1), now)
        .await
        .map_err(|e| e.to_string())?;

    let hour = now
        .duration_trunc(chrono::Duration::hours(1))
        .unwrap_or(now)
        - chrono::Duration::hours(1);

    match rollup::rollup_hour(&samples, hour) {
        Some(entry) => {
            info!(
                "Hourly roll-up recorded for {} ({} samples)",
                entry.hour, entry.grid.samples
            );
            state.broadcaster.publish(Event::new(EventKind::Analytics, &entry));
            state.analytics.push(entry).await;
        }
        None => debug!("No samples in the last hour; roll-up skipped"),
    }

    state
        .samples
        .trim_older_than(now - chrono::Duration::days(retention_days as i64))
        .await
        .map_err(|e| e.to_string())?;

    Ok(())
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let latest = state.pipeline.latest_reading().await;

    Json(serde_json::json!({
        "status": "running",
        "subscribers": state.broadcaster.subscriber_count(),
        "lastReadingAt": latest.map(|r| r.timestamp),
    }))
}

/// On-demand energy poll. Serves the cached reading while it is fresh,
/// falls back to the last known reading when the gateway is down, and
/// only errors when nothing has ever been fetched.
async fn get_energy(State(state): State<Arc<AppState>>) -> Response {
    match state.pipeline.poll_once().await {
        Ok(reading) => Json(reading).into_response(),
        Err(e) => {
            warn!("on-demand poll failed: {}", e);
            match state.pipeline.latest_reading().await {
                Some(reading) => Json(reading).into_response(),
                None => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(serde_json::json!({
                        "error": format!("energy data unavailable: {}", e)
                    })),
                )
                    .into_response(),
            }
        }
    }
}

/// Latest cached reading without touching the gateway
async fn get_latest_reading(State(state): State<Arc<AppState>>) -> Response {
    match state.pipeline.latest_reading().await {
        Some(reading) => Json(reading).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "no reading yet"})),
        )
            .into_response(),
    }
}

#[derive(Deserialize)]
struct RangeParams {
    range: Option<String>,
}

fn parse_range(range: &str) -> Option<chrono::Duration> {
    match range {
        "24h" => Some(chrono::Duration::hours(24)),
        "7d" => Some(chrono::Duration::days(7)),
        "30d" => Some(chrono::Duration::days(30)),
        _ => None,
    }
}

/// Sample history over a named range
async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Response {
    let range = params.range.as_deref().unwrap_or("24h");
    let window = match parse_range(range) {
        Some(window) => window,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": format!("unknown range: {}", range)})),
            )
                .into_response();
        }
    };

    match state.samples.since(Utc::now() - window).await {
        Ok(samples) => Json(samples).into_response(),
        Err(e) => {
            error!("history query failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "history unavailable"})),
            )
                .into_response()
        }
    }
}

/// Hourly analytics entries over a named range
async fn get_analytics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Response {
    let range = params.range.as_deref().unwrap_or("24h");
    let window = match parse_range(range) {
        Some(window) => window,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": format!("unknown range: {}", range)})),
            )
                .into_response();
        }
    };

    Json(state.analytics.since(Utc::now() - window).await).into_response()
}

#[derive(Deserialize)]
struct BaselineParams {
    days: Option<u32>,
}

/// Recent daily baselines, newest first
async fn get_baselines(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BaselineParams>,
) -> Response {
    let days = params.days.unwrap_or(7).clamp(1, 365);

    match state.baselines.recent(days).await {
        Ok(baselines) => Json(baselines).into_response(),
        Err(e) => {
            error!("baseline query failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "baselines unavailable"})),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
struct AlertParams {
    limit: Option<usize>,
}

/// Active alerts, most recent first
async fn get_alerts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AlertParams>,
) -> Json<Vec<crate::domain::entities::alert::Alert>> {
    let limit = params.limit.unwrap_or(50).min(100);
    Json(state.alerts.list(limit).await)
}

/// Clear an active alert by kind id; the next breach re-raises it
async fn clear_alert(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    if state.alerts.clear(&id).await {
        info!("Alert cleared: {}", id);
        Json(serde_json::json!({"cleared": id})).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": format!("no active alert with id: {}", id)})),
        )
            .into_response()
    }
}

/// Current settings snapshot
async fn get_settings(State(state): State<Arc<AppState>>) -> Json<Settings> {
    Json(state.settings.snapshot().await)
}

/// Admin settings update; persists a whole-document snapshot
async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<Settings>,
) -> Response {
    match state.settings.update(settings).await {
        Ok(updated) => Json(updated).into_response(),
        Err(e) => {
            error!("settings update failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "settings not saved"})),
            )
                .into_response()
        }
    }
}
