//! Background fan-out of newly stored alerts

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use super::config::{NotifyConfig, NotifyTarget};
use super::notifier::Notifier;
use crate::storage::{AlertRecord, StorageEngine};

/// Forwards every alert inserted into the store to the notification targets
pub struct AlertDispatcher {
    engine: Arc<StorageEngine>,
    config: NotifyConfig,
    /// Shutdown signal sender
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl AlertDispatcher {
    pub fn new(engine: Arc<StorageEngine>, config: NotifyConfig) -> Self {
        Self {
            engine,
            config,
            shutdown_tx: None,
        }
    }

    /// Start the background dispatcher
    pub fn start(&mut self) -> tokio::task::JoinHandle<()> {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        self.shutdown_tx = Some(shutdown_tx);

        let mut alerts = self.engine.subscribe_alerts();
        let targets = self.config.targets.clone();
        let notifier = Notifier::new();

        tokio::spawn(async move {
            tracing::info!(targets = targets.len(), "Alert dispatcher started");

            loop {
                tokio::select! {
                    received = alerts.recv() => {
                        match received {
                            Ok(alert) => Self::dispatch(&notifier, &alert, &targets).await,
                            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                                tracing::warn!(skipped, "Alert dispatcher lagged behind");
                            }
                            Err(broadcast::error::RecvError::Closed) => break,
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        tracing::info!("Alert dispatcher shutting down");
                        break;
                    }
                }
            }
        })
    }

    /// Stop the background dispatcher
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
    }

    async fn dispatch(
        notifier: &Notifier,
        alert: &AlertRecord,
        targets: &[NotifyTarget],
    ) {
        if let Err(e) = notifier.notify(alert, targets).await {
            tracing::error!(
                alert_id = %alert.id,
                error = %e,
                "Failed to send notification"
            );
        }
    }
}
