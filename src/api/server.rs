use axum::{
    http::{header, HeaderName},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    alert_stream, device_status, get_config, health_check, ingest_reading, list_alerts,
    list_devices, list_readings, list_scenarios, mark_alert_read, mark_all_read,
    register_device, update_config, AppState,
};
use crate::alerts::{AlertDispatcher, NotifyConfig};
use crate::ingest::{Ingestor, DEFAULT_STORE_TIMEOUT};
use crate::sensors::SimulatorWorker;
use crate::storage::{Device, StorageEngine, DEFAULT_ALERT_RETENTION};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Bound on every storage round trip during ingestion
    pub store_timeout: Duration,
    /// Device fed by the built-in simulator, disabled when `None`
    pub simulator_device: Option<String>,
    pub simulator_interval_secs: u64,
    pub alert_webhook: Option<String>,
    /// Devices registered at startup
    pub seed_devices: Vec<String>,
    /// Alerts kept per device
    pub alert_retention: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            simulator_device: None,
            simulator_interval_secs: 3,
            alert_webhook: None,
            seed_devices: vec!["sia-box-01".to_string()],
            alert_retention: DEFAULT_ALERT_RETENTION,
        }
    }
}

impl ServerConfig {
    /// Create a server config from environment variables
    /// SIA_HOST=0.0.0.0
    /// SIA_PORT=8080
    /// SIA_STORE_TIMEOUT_MS=5000
    /// SIA_SIMULATOR_DEVICE=sia-box-01
    /// SIA_SIMULATOR_INTERVAL_SECS=3
    /// SIA_ALERT_WEBHOOK=https://hooks.example.com/alerts
    /// SIA_SEED_DEVICES=sia-box-01,sia-box-02
    /// SIA_ALERT_RETENTION=1000
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = std::env::var("SIA_HOST").unwrap_or(defaults.host);
        let port = std::env::var("SIA_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);
        let store_timeout = std::env::var("SIA_STORE_TIMEOUT_MS")
            .ok()
            .and_then(|m| m.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.store_timeout);
        let simulator_device = std::env::var("SIA_SIMULATOR_DEVICE")
            .ok()
            .filter(|d| !d.trim().is_empty());
        let simulator_interval_secs = std::env::var("SIA_SIMULATOR_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.simulator_interval_secs);
        let alert_webhook = std::env::var("SIA_ALERT_WEBHOOK").ok();
        let seed_devices = std::env::var("SIA_SEED_DEVICES")
            .map(|s| {
                s.split(',')
                    .map(|id| id.trim())
                    .filter(|id| !id.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or(defaults.seed_devices);
        let alert_retention = std::env::var("SIA_ALERT_RETENTION")
            .ok()
            .and_then(|n| n.parse().ok())
            .unwrap_or(defaults.alert_retention);

        Self {
            host,
            port,
            store_timeout,
            simulator_device,
            simulator_interval_secs,
            alert_webhook,
            seed_devices,
            alert_retention,
        }
    }
}

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Device reports
        .route("/functions/v1/sensores-update", post(ingest_reading))
        .route("/sensores-update", post(ingest_reading))
        .route("/scenarios", get(list_scenarios))
        // Devices
        .route("/devices", get(list_devices).post(register_device))
        .route("/devices/:id/config", get(get_config).put(update_config))
        .route("/devices/:id/readings", get(list_readings))
        .route("/devices/:id/status", get(device_status))
        // Alerts
        .route("/devices/:id/alerts", get(list_alerts))
        .route("/devices/:id/alerts/read-all", post(mark_all_read))
        .route("/alerts/:id/read", post(mark_alert_read))
        .route("/alerts/stream", get(alert_stream))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers([
                    header::AUTHORIZATION,
                    header::CONTENT_TYPE,
                    HeaderName::from_static("x-client-info"),
                    HeaderName::from_static("apikey"),
                ]),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let engine = Arc::new(StorageEngine::new().with_alert_retention(config.alert_retention));

    for device_id in &config.seed_devices {
        engine.register_device(Device::new(device_id.as_str(), device_id.as_str()))?;
        tracing::info!(device_id = %device_id, "Seeded device");
    }

    let ingestor = Ingestor::from_engine(Arc::clone(&engine)).with_store_timeout(config.store_timeout);
    let state = Arc::new(AppState::new(Arc::clone(&engine), ingestor.clone()));

    // Start background workers
    let mut dispatcher = AlertDispatcher::new(
        Arc::clone(&engine),
        NotifyConfig::with_optional_webhook(config.alert_webhook.clone()),
    );
    let dispatcher_handle = dispatcher.start();

    let simulator = config.simulator_device.as_ref().map(|device_id| {
        if !engine.has_device(device_id) {
            tracing::warn!(device_id = %device_id, "Simulator device is not registered");
        }
        let worker = Arc::new(SimulatorWorker::new(
            ingestor.clone(),
            device_id.as_str(),
            Duration::from_secs(config.simulator_interval_secs.max(1)),
        ));
        let handle = Arc::clone(&worker).start();
        (worker, handle)
    });

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Starting SIA Monitor on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown signal received, stopping workers...");
    if let Some((worker, handle)) = simulator {
        worker.stop();
        handle.abort();
    }
    dispatcher.stop().await;
    dispatcher_handle.abort();

    tracing::info!("SIA Monitor stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for CTRL+C");
    }
}
