//! SIA Monitor: industrial sensor monitoring backend
//!
//! Field boxes report temperature, gas, flame, motion, vibration and
//! distance readings. Each report is stored, classified against the
//! device's thresholds and, when abnormal, recorded as an alert that is
//! pushed to dashboard subscribers and notification targets.
//!
//! # Features
//!
//! - **Classification**: Ordered rule cascade from NORMAL up to CRÍTICO
//! - **Per-Device Thresholds**: Stored overrides with built-in defaults
//! - **Alert Feed**: Unread tracking, level filters and a live SSE stream
//! - **Dashboard Summaries**: Status badge and banded gauges
//! - **Simulator**: Drifting synthetic readings for demos
//!
//! # Example
//!
//! ```no_run
//! use sia_monitor::sensors::{classify, DeviceConfig, SCENARIOS};
//!
//! let reading = SCENARIOS[3].values.to_reading("sia-box-01", 0);
//! let alert = classify(&reading, &DeviceConfig::default());
//! println!("{}: {}", alert.level, alert.message);
//! ```

pub mod alerts;
pub mod api;
pub mod ingest;
pub mod sensors;
pub mod storage;

// Re-export commonly used types
pub use ingest::{IngestError, IngestPayload, Ingestor};
pub use sensors::{classify, AlertDescriptor, AlertLevel, DeviceConfig, SensorReading};
pub use storage::{StorageEngine, StorageError};
