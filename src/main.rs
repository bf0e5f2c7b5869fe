//! SIA Monitor Server
//!
//! Run with: cargo run
//!
//! Environment variables:
//! - SIA_HOST: Bind address (default: 0.0.0.0)
//! - SIA_PORT: Port number (default: 8080)
//! - SIA_STORE_TIMEOUT_MS: Bound on each storage call during ingestion (default: 5000)
//! - SIA_SEED_DEVICES: Comma-separated devices registered at startup (default: sia-box-01)
//! - SIA_SIMULATOR_DEVICE: Feed this device with simulated readings (default: off)
//! - SIA_SIMULATOR_INTERVAL_SECS: Simulator tick (default: 3)
//! - SIA_ALERT_WEBHOOK: URL receiving every new alert as JSON (default: off)
//! - SIA_ALERT_RETENTION: Alerts kept per device (default: 1000)
//! - RUST_LOG: Log level (default: info)

use sia_monitor::api::{run_server, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sia_monitor=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();

    tracing::info!("SIA Monitor configuration:");
    tracing::info!("  Host: {}:{}", config.host, config.port);
    tracing::info!("  Store timeout: {:?}", config.store_timeout);
    tracing::info!("  Seed devices: {}", config.seed_devices.join(", "));
    tracing::info!("  Alert retention: {} per device", config.alert_retention);
    match &config.simulator_device {
        Some(device) => tracing::info!(
            "  Simulator: {} every {} seconds",
            device,
            config.simulator_interval_secs
        ),
        None => tracing::info!("  Simulator: DISABLED"),
    }
    if let Some(url) = &config.alert_webhook {
        tracing::info!("  Alert webhook: {}", url);
    }

    println!(
        r#"
   ____ ___    _
  / ___|_ _|  / \
  \___ \| |  / _ \
   ___) | | / ___ \
  |____/___/_/   \_\

 Industrial Sensor Monitor
 Version: {}
"#,
        env!("CARGO_PKG_VERSION")
    );

    run_server(config).await
}
