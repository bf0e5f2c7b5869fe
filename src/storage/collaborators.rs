//! Storage seams used by ingestion
//!
//! Ingestion talks to persistence only through these traits so each
//! collaborator can be swapped (or made to fail) independently.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sensors::{AlertDescriptor, AlertLevel, DeviceConfig, SensorReading};

/// Registered monitoring device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub device_id: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Device {
    pub fn new(device_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            name: name.into(),
            location: None,
            status: Some("online".to_string()),
            created_at: Utc::now(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Persisted reading row
#[derive(Debug, Clone, Serialize)]
pub struct ReadingRecord {
    pub id: String,
    #[serde(flatten)]
    pub reading: SensorReading,
    pub created_at: DateTime<Utc>,
}

/// Alert row before the store assigns identity
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    pub device_id: String,
    pub level: AlertLevel,
    pub message: String,
    pub cause: String,
    pub action: String,
}

impl NewAlert {
    pub fn from_descriptor(device_id: impl Into<String>, alert: &AlertDescriptor) -> Self {
        Self {
            device_id: device_id.into(),
            level: alert.level,
            message: alert.message.clone(),
            cause: alert.cause.clone(),
            action: alert.action.clone(),
        }
    }
}

/// Persisted alert row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: String,
    pub device_id: String,
    pub level: AlertLevel,
    pub message: String,
    pub cause: String,
    pub action: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    async fn device_exists(&self, device_id: &str) -> Result<bool, StorageError>;
}

#[async_trait]
pub trait ReadingStore: Send + Sync {
    async fn insert_reading(&self, reading: &SensorReading) -> Result<ReadingRecord, StorageError>;
}

#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Insert an unread alert
    async fn insert_alert(&self, alert: NewAlert) -> Result<AlertRecord, StorageError>;
}

#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Stored configuration, `None` when the device never saved one
    async fn device_config(&self, device_id: &str) -> Result<Option<DeviceConfig>, StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Device '{0}' already exists")]
    DeviceExists(String),

    #[error("Device '{0}' not found")]
    DeviceNotFound(String),

    #[error("Alert '{0}' not found")]
    AlertNotFound(String),

    #[error("{0} timed out")]
    Timeout(&'static str),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}
