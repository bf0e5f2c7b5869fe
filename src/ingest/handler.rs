//! Ingestion of a single device report
//!
//! validate → device lookup → store reading → classify → store alert
//!
//! The reading write is the durable guarantee of a report: any failure up to
//! and including it aborts the request. Alert persistence is best effort and a
//! failure there still yields a successful outcome carrying the computed alert.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::payload::IngestPayload;
use crate::sensors::{classify, AlertDescriptor, DeviceConfig};
use crate::storage::{
    AlertRecord, AlertStore, ConfigStore, DeviceRegistry, NewAlert, ReadingRecord, ReadingStore,
    StorageEngine, StorageError,
};

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of a successful ingestion
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub reading: ReadingRecord,
    /// Always present, `NORMAL` included
    pub alert: AlertDescriptor,
    /// `None` for `NORMAL` readings or when the alert write failed
    pub alert_record: Option<AlertRecord>,
}

/// Orchestrates one report across the storage collaborators
#[derive(Clone)]
pub struct Ingestor {
    devices: Arc<dyn DeviceRegistry>,
    readings: Arc<dyn ReadingStore>,
    alerts: Arc<dyn AlertStore>,
    configs: Arc<dyn ConfigStore>,
    store_timeout: Duration,
}

impl Ingestor {
    pub fn new(
        devices: Arc<dyn DeviceRegistry>,
        readings: Arc<dyn ReadingStore>,
        alerts: Arc<dyn AlertStore>,
        configs: Arc<dyn ConfigStore>,
    ) -> Self {
        Self {
            devices,
            readings,
            alerts,
            configs,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Use one engine for every collaborator
    pub fn from_engine(engine: Arc<StorageEngine>) -> Self {
        Self::new(
            engine.clone(),
            engine.clone(),
            engine.clone(),
            engine,
        )
    }

    /// Bound each storage round trip
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub async fn ingest(&self, payload: IngestPayload) -> Result<IngestOutcome, IngestError> {
        let now = chrono::Utc::now().timestamp_millis();
        let reading = payload.into_reading(now)?;
        let device_id = reading.device_id.clone();

        let exists = self
            .bounded("device lookup", self.devices.device_exists(&device_id))
            .await?;
        if !exists {
            tracing::warn!(device_id = %device_id, "Report from unknown device");
            return Err(IngestError::DeviceNotFound(device_id));
        }

        let record = self
            .bounded("reading insert", self.readings.insert_reading(&reading))
            .await
            .map_err(|e| {
                tracing::error!(device_id = %device_id, error = %e, "Failed to store reading");
                e
            })?;

        let config = self.thresholds_for(&device_id).await;
        let alert = classify(&reading, &config);

        tracing::debug!(
            device_id = %device_id,
            level = %alert.level,
            temperature = reading.temperature,
            gas = reading.gas,
            "Reading classified"
        );

        let alert_record = if alert.level.is_normal() {
            None
        } else {
            let new_alert = NewAlert::from_descriptor(&device_id, &alert);
            match self
                .bounded("alert insert", self.alerts.insert_alert(new_alert))
                .await
            {
                Ok(stored) => Some(stored),
                Err(e) => {
                    tracing::error!(
                        device_id = %device_id,
                        level = %alert.level,
                        error = %e,
                        "Failed to store alert"
                    );
                    None
                }
            }
        };

        Ok(IngestOutcome {
            reading: record,
            alert,
            alert_record,
        })
    }

    /// Stored thresholds, falling back to defaults when none are saved or the
    /// configuration source cannot be reached
    async fn thresholds_for(&self, device_id: &str) -> DeviceConfig {
        match self
            .bounded("config lookup", self.configs.device_config(device_id))
            .await
        {
            Ok(Some(config)) => config,
            Ok(None) => DeviceConfig::default(),
            Err(e) => {
                tracing::warn!(
                    device_id = %device_id,
                    error = %e,
                    "Threshold lookup failed, using defaults"
                );
                DeviceConfig::default()
            }
        }
    }

    async fn bounded<T>(
        &self,
        step: &'static str,
        fut: impl Future<Output = Result<T, StorageError>>,
    ) -> Result<T, StorageError> {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout(step)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Dados inválidos: {0}")]
    InvalidPayload(&'static str),

    #[error("Dispositivo não encontrado: {0}")]
    DeviceNotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
