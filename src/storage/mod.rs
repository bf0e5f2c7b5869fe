pub mod collaborators;
pub mod engine;

pub use collaborators::{
    AlertRecord, AlertStore, ConfigStore, Device, DeviceRegistry, NewAlert, ReadingRecord,
    ReadingStore, StorageError,
};
pub use engine::{
    AlertFilter, StorageEngine, DEFAULT_ALERT_RETENTION, DEFAULT_READING_RETENTION,
};
