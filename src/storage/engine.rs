use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::str::FromStr;
use tokio::sync::broadcast;

use super::collaborators::{
    AlertRecord, AlertStore, ConfigStore, Device, DeviceRegistry, NewAlert, ReadingRecord,
    ReadingStore, StorageError,
};
use crate::sensors::{AlertLevel, DeviceConfig, SensorReading, UnknownLevel};

/// Readings kept per device before the oldest are dropped
pub const DEFAULT_READING_RETENTION: usize = 10_000;

/// Alerts kept per device before the oldest are dropped
pub const DEFAULT_ALERT_RETENTION: usize = 1_000;

const ALERT_CHANNEL_CAPACITY: usize = 256;

/// Selection applied when listing alerts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertFilter {
    #[default]
    All,
    Unread,
    Level(AlertLevel),
}

impl AlertFilter {
    fn matches(&self, alert: &AlertRecord) -> bool {
        match self {
            AlertFilter::All => true,
            AlertFilter::Unread => !alert.read,
            AlertFilter::Level(level) => alert.level == *level,
        }
    }
}

impl FromStr for AlertFilter {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todos" => Ok(AlertFilter::All),
            "nao-lidos" => Ok(AlertFilter::Unread),
            level => level.parse().map(AlertFilter::Level),
        }
    }
}

/// In-memory store backing devices, readings, alerts and configuration
pub struct StorageEngine {
    devices: DashMap<String, Device>,
    configs: DashMap<String, DeviceConfig>,
    /// Readings per device, oldest first
    readings: DashMap<String, VecDeque<ReadingRecord>>,
    /// Alerts per device, oldest first
    alerts: RwLock<HashMap<String, VecDeque<AlertRecord>>>,
    alert_tx: broadcast::Sender<AlertRecord>,
    reading_retention: usize,
    alert_retention: usize,
}

impl StorageEngine {
    pub fn new() -> Self {
        Self::with_reading_retention(DEFAULT_READING_RETENTION)
    }

    pub fn with_reading_retention(reading_retention: usize) -> Self {
        let (alert_tx, _) = broadcast::channel(ALERT_CHANNEL_CAPACITY);
        Self {
            devices: DashMap::new(),
            configs: DashMap::new(),
            readings: DashMap::new(),
            alerts: RwLock::new(HashMap::new()),
            alert_tx,
            reading_retention: reading_retention.max(1),
            alert_retention: DEFAULT_ALERT_RETENTION,
        }
    }

    /// Cap the alert history kept per device
    pub fn with_alert_retention(mut self, alert_retention: usize) -> Self {
        self.alert_retention = alert_retention.max(1);
        self
    }

    // ------------------------------------------------------------------
    // Devices
    // ------------------------------------------------------------------

    pub fn register_device(&self, device: Device) -> Result<(), StorageError> {
        match self.devices.entry(device.device_id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(StorageError::DeviceExists(device.device_id))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(device);
                Ok(())
            }
        }
    }

    pub fn get_device(&self, device_id: &str) -> Option<Device> {
        self.devices.get(device_id).map(|d| d.clone())
    }

    pub fn has_device(&self, device_id: &str) -> bool {
        self.devices.contains_key(device_id)
    }

    /// All devices, sorted by id
    pub fn list_devices(&self) -> Vec<Device> {
        let mut devices: Vec<Device> = self.devices.iter().map(|e| e.value().clone()).collect();
        devices.sort_by(|a, b| a.device_id.cmp(&b.device_id));
        devices
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Stored configuration, or defaults when none was saved
    pub fn resolved_config(&self, device_id: &str) -> DeviceConfig {
        self.configs
            .get(device_id)
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    pub fn save_config(&self, device_id: &str, config: DeviceConfig) -> Result<(), StorageError> {
        if !self.has_device(device_id) {
            return Err(StorageError::DeviceNotFound(device_id.to_string()));
        }
        self.configs.insert(device_id.to_string(), config);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Readings
    // ------------------------------------------------------------------

    fn append_reading(&self, reading: &SensorReading) -> ReadingRecord {
        let record = ReadingRecord {
            id: uuid::Uuid::new_v4().to_string(),
            reading: reading.clone(),
            created_at: Utc::now(),
        };

        let mut entry = self.readings.entry(reading.device_id.clone()).or_default();
        if entry.len() >= self.reading_retention {
            entry.pop_front();
        }
        entry.push_back(record.clone());

        record
    }

    /// Most recent readings of a device, newest first
    pub fn latest_readings(&self, device_id: &str, limit: usize) -> Vec<ReadingRecord> {
        self.readings
            .get(device_id)
            .map(|r| r.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub fn latest_reading(&self, device_id: &str) -> Option<ReadingRecord> {
        self.readings
            .get(device_id)
            .and_then(|r| r.back().cloned())
    }

    pub fn reading_count(&self, device_id: &str) -> usize {
        self.readings.get(device_id).map(|r| r.len()).unwrap_or(0)
    }

    // ------------------------------------------------------------------
    // Alerts
    // ------------------------------------------------------------------

    fn append_alert(&self, alert: NewAlert) -> AlertRecord {
        let record = AlertRecord {
            id: uuid::Uuid::new_v4().to_string(),
            device_id: alert.device_id,
            level: alert.level,
            message: alert.message,
            cause: alert.cause,
            action: alert.action,
            read: false,
            created_at: Utc::now(),
        };

        {
            let mut alerts = self.alerts.write();
            let history = alerts.entry(record.device_id.clone()).or_default();
            if history.len() >= self.alert_retention {
                history.pop_front();
            }
            history.push_back(record.clone());
        }

        // No subscribers is not an error
        let _ = self.alert_tx.send(record.clone());

        record
    }

    /// Alerts of a device matching `filter`, newest first
    pub fn list_alerts(
        &self,
        device_id: &str,
        filter: AlertFilter,
        limit: usize,
    ) -> Vec<AlertRecord> {
        let alerts = self.alerts.read();
        alerts
            .get(device_id)
            .map(|history| {
                history
                    .iter()
                    .rev()
                    .filter(|a| filter.matches(a))
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn unread_count(&self, device_id: &str) -> usize {
        let alerts = self.alerts.read();
        alerts
            .get(device_id)
            .map(|history| history.iter().filter(|a| !a.read).count())
            .unwrap_or(0)
    }

    pub fn alert_count(&self, device_id: &str) -> usize {
        self.alerts.read().get(device_id).map(|h| h.len()).unwrap_or(0)
    }

    pub fn mark_alert_read(&self, alert_id: &str) -> Result<AlertRecord, StorageError> {
        let mut alerts = self.alerts.write();
        let alert = alerts
            .values_mut()
            .flat_map(|history| history.iter_mut())
            .find(|a| a.id == alert_id)
            .ok_or_else(|| StorageError::AlertNotFound(alert_id.to_string()))?;
        alert.read = true;
        Ok(alert.clone())
    }

    /// Mark every unread alert of a device; returns how many changed
    pub fn mark_all_read(&self, device_id: &str) -> usize {
        let mut alerts = self.alerts.write();
        let Some(history) = alerts.get_mut(device_id) else {
            return 0;
        };
        let mut marked = 0;
        for alert in history.iter_mut().filter(|a| !a.read) {
            alert.read = true;
            marked += 1;
        }
        marked
    }

    /// Receive every alert inserted from now on
    pub fn subscribe_alerts(&self) -> broadcast::Receiver<AlertRecord> {
        self.alert_tx.subscribe()
    }
}

impl Default for StorageEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceRegistry for StorageEngine {
    async fn device_exists(&self, device_id: &str) -> Result<bool, StorageError> {
        Ok(self.has_device(device_id))
    }
}

#[async_trait]
impl ReadingStore for StorageEngine {
    async fn insert_reading(&self, reading: &SensorReading) -> Result<ReadingRecord, StorageError> {
        Ok(self.append_reading(reading))
    }
}

#[async_trait]
impl AlertStore for StorageEngine {
    async fn insert_alert(&self, alert: NewAlert) -> Result<AlertRecord, StorageError> {
        Ok(self.append_alert(alert))
    }
}

#[async_trait]
impl ConfigStore for StorageEngine {
    async fn device_config(&self, device_id: &str) -> Result<Option<DeviceConfig>, StorageError> {
        Ok(self.configs.get(device_id).map(|c| c.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_alert(device_id: &str, level: AlertLevel) -> NewAlert {
        NewAlert {
            device_id: device_id.to_string(),
            level,
            message: "msg".to_string(),
            cause: String::new(),
            action: String::new(),
        }
    }

    #[test]
    fn test_register_device() {
        let engine = StorageEngine::new();

        engine.register_device(Device::new("sia-box-01", "Box 1")).unwrap();
        assert!(engine.has_device("sia-box-01"));
        assert!(!engine.has_device("missing"));

        assert!(matches!(
            engine.register_device(Device::new("sia-box-01", "Again")),
            Err(StorageError::DeviceExists(_))
        ));
        assert_eq!(engine.get_device("sia-box-01").unwrap().name, "Box 1");
    }

    #[test]
    fn test_list_devices_sorted() {
        let engine = StorageEngine::new();
        engine.register_device(Device::new("b", "B")).unwrap();
        engine.register_device(Device::new("a", "A")).unwrap();

        let ids: Vec<String> = engine.list_devices().into_iter().map(|d| d.device_id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_config_defaults_and_save() {
        let engine = StorageEngine::new();
        assert_eq!(engine.resolved_config("dev"), DeviceConfig::default());

        assert!(matches!(
            engine.save_config("dev", DeviceConfig::default()),
            Err(StorageError::DeviceNotFound(_))
        ));

        engine.register_device(Device::new("dev", "Dev")).unwrap();
        let config = DeviceConfig {
            temp_high: 42.0,
            ..DeviceConfig::default()
        };
        engine.save_config("dev", config.clone()).unwrap();
        assert_eq!(engine.resolved_config("dev"), config);
    }

    #[tokio::test]
    async fn test_reading_retention() {
        let engine = StorageEngine::with_reading_retention(3);

        for i in 0..5 {
            let reading = SensorReading::new("dev", i).with_temperature(i as f64);
            engine.insert_reading(&reading).await.unwrap();
        }

        assert_eq!(engine.reading_count("dev"), 3);
        let latest = engine.latest_readings("dev", 10);
        assert_eq!(latest.len(), 3);
        assert_eq!(latest[0].reading.timestamp_millis, 4);
        assert_eq!(latest[2].reading.timestamp_millis, 2);
        assert_eq!(engine.latest_reading("dev").unwrap().reading.timestamp_millis, 4);
        assert!(engine.latest_reading("other").is_none());
    }

    #[tokio::test]
    async fn test_list_alerts_newest_first_with_filters() {
        let engine = StorageEngine::new();

        let first = engine
            .insert_alert(new_alert("dev", AlertLevel::Attention))
            .await
            .unwrap();
        engine.insert_alert(new_alert("dev", AlertLevel::Critical)).await.unwrap();
        engine.insert_alert(new_alert("other", AlertLevel::High)).await.unwrap();

        let all = engine.list_alerts("dev", AlertFilter::All, 50);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].level, AlertLevel::Critical);
        assert!(all.iter().all(|a| !a.read));

        engine.mark_alert_read(&first.id).unwrap();
        let unread = engine.list_alerts("dev", AlertFilter::Unread, 50);
        assert_eq!(unread.len(), 1);
        assert_eq!(engine.unread_count("dev"), 1);

        let critical = engine.list_alerts("dev", AlertFilter::Level(AlertLevel::Critical), 50);
        assert_eq!(critical.len(), 1);

        assert_eq!(engine.list_alerts("dev", AlertFilter::All, 1).len(), 1);
    }

    #[tokio::test]
    async fn test_alert_retention() {
        let engine = StorageEngine::with_reading_retention(5).with_alert_retention(3);

        for i in 0..20 {
            let reading = SensorReading::new("dev", i).with_flame(1);
            engine.insert_reading(&reading).await.unwrap();
            engine.insert_alert(new_alert("dev", AlertLevel::Critical)).await.unwrap();
        }
        let kept = engine.insert_alert(new_alert("dev", AlertLevel::High)).await.unwrap();
        engine.insert_alert(new_alert("other", AlertLevel::High)).await.unwrap();

        assert_eq!(engine.reading_count("dev"), 5);
        assert_eq!(engine.alert_count("dev"), 3);
        assert_eq!(engine.alert_count("other"), 1);
        assert_eq!(engine.unread_count("dev"), 3);

        let newest = engine.list_alerts("dev", AlertFilter::All, 50);
        assert_eq!(newest.len(), 3);
        assert_eq!(newest[0].id, kept.id);
        assert!(engine.mark_alert_read(&kept.id).is_ok());
    }

    #[tokio::test]
    async fn test_mark_all_read() {
        let engine = StorageEngine::new();
        for _ in 0..3 {
            engine.insert_alert(new_alert("dev", AlertLevel::High)).await.unwrap();
        }
        engine.insert_alert(new_alert("other", AlertLevel::High)).await.unwrap();

        assert_eq!(engine.mark_all_read("dev"), 3);
        assert_eq!(engine.mark_all_read("dev"), 0);
        assert_eq!(engine.unread_count("other"), 1);
    }

    #[test]
    fn test_mark_unknown_alert() {
        let engine = StorageEngine::new();
        assert!(matches!(
            engine.mark_alert_read("nope"),
            Err(StorageError::AlertNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_subscribe_receives_inserted_alerts() {
        let engine = StorageEngine::new();
        let mut rx = engine.subscribe_alerts();

        let inserted = engine.insert_alert(new_alert("dev", AlertLevel::High)).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received, inserted);
    }

    #[test]
    fn test_alert_filter_parse() {
        assert_eq!("todos".parse::<AlertFilter>().unwrap(), AlertFilter::All);
        assert_eq!("nao-lidos".parse::<AlertFilter>().unwrap(), AlertFilter::Unread);
        assert_eq!(
            "ALTO".parse::<AlertFilter>().unwrap(),
            AlertFilter::Level(AlertLevel::High)
        );
        assert!("bogus".parse::<AlertFilter>().is_err());
    }
}
