//! Per-device threshold configuration
//!
//! Stored configuration may omit any field; missing values resolve to the
//! constants below before a classification ever sees them.

use serde::{Deserialize, Serialize};

pub const DEFAULT_TEMP_LOW: f64 = 20.0;
pub const DEFAULT_TEMP_MEDIUM: f64 = 30.0;
pub const DEFAULT_TEMP_HIGH: f64 = 40.0;
pub const DEFAULT_TEMP_CRITICAL: f64 = 50.0;

pub const DEFAULT_GAS_LOW: f64 = 150.0;
pub const DEFAULT_GAS_MEDIUM: f64 = 250.0;
pub const DEFAULT_GAS_HIGH: f64 = 350.0;
pub const DEFAULT_GAS_CRITICAL: f64 = 500.0;
/// Gas boundary of the combined gas + vibration rule
pub const DEFAULT_GAS_COMPOUND: f64 = 400.0;

pub const DEFAULT_VIB_LOW: f64 = 20.0;
pub const DEFAULT_VIB_MEDIUM: f64 = 40.0;
pub const DEFAULT_VIB_HIGH: f64 = 60.0;

pub const DEFAULT_Z_THRESHOLD: f64 = 2.8;
pub const DEFAULT_WINDOW_SIZE: u32 = 10;

/// Increasing boundaries for one metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSet {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical: Option<f64>,
}

impl ThresholdSet {
    pub const fn new(low: f64, medium: f64, high: f64) -> Self {
        Self {
            low,
            medium,
            high,
            critical: None,
        }
    }

    pub const fn with_critical(mut self, critical: f64) -> Self {
        self.critical = Some(critical);
        self
    }

    /// Whether the boundaries are non-decreasing
    pub fn is_ordered(&self) -> bool {
        let ordered = self.low <= self.medium && self.medium <= self.high;
        match self.critical {
            Some(critical) => ordered && self.high <= critical,
            None => ordered,
        }
    }
}

/// Threshold configuration of a single device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub temp_low: f64,
    pub temp_medium: f64,
    pub temp_high: f64,
    pub temp_critical: f64,
    pub gas_low: f64,
    pub gas_medium: f64,
    pub gas_high: f64,
    pub gas_critical: f64,
    pub gas_compound: f64,
    pub vib_low: f64,
    pub vib_medium: f64,
    pub vib_high: f64,
    /// Kept for the settings page; classification never reads it
    pub z_threshold: f64,
    /// Kept for the settings page; classification never reads it
    pub window_size: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            temp_low: DEFAULT_TEMP_LOW,
            temp_medium: DEFAULT_TEMP_MEDIUM,
            temp_high: DEFAULT_TEMP_HIGH,
            temp_critical: DEFAULT_TEMP_CRITICAL,
            gas_low: DEFAULT_GAS_LOW,
            gas_medium: DEFAULT_GAS_MEDIUM,
            gas_high: DEFAULT_GAS_HIGH,
            gas_critical: DEFAULT_GAS_CRITICAL,
            gas_compound: DEFAULT_GAS_COMPOUND,
            vib_low: DEFAULT_VIB_LOW,
            vib_medium: DEFAULT_VIB_MEDIUM,
            vib_high: DEFAULT_VIB_HIGH,
            z_threshold: DEFAULT_Z_THRESHOLD,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl DeviceConfig {
    pub fn temperature(&self) -> ThresholdSet {
        ThresholdSet::new(self.temp_low, self.temp_medium, self.temp_high)
            .with_critical(self.temp_critical)
    }

    pub fn gas(&self) -> ThresholdSet {
        ThresholdSet::new(self.gas_low, self.gas_medium, self.gas_high)
            .with_critical(self.gas_critical)
    }

    pub fn vibration(&self) -> ThresholdSet {
        ThresholdSet::new(self.vib_low, self.vib_medium, self.vib_high)
    }

    /// Check that every metric's boundaries increase
    pub fn validate(&self) -> Result<(), ConfigError> {
        let metrics = [
            ("temperature", self.temperature()),
            ("gas", self.gas()),
            ("vibration", self.vibration()),
        ];

        for (metric, set) in metrics {
            if !set.is_ordered() {
                return Err(ConfigError::Unordered(metric));
            }
        }

        if !self.gas_compound.is_finite() {
            return Err(ConfigError::NotFinite("gas_compound"));
        }
        if self.window_size == 0 {
            return Err(ConfigError::EmptyWindow);
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} thresholds must be non-decreasing (low <= medium <= high <= critical)")]
    Unordered(&'static str),

    #[error("{0} must be a finite number")]
    NotFinite(&'static str),

    #[error("window_size must be at least 1")]
    EmptyWindow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DeviceConfig::default();
        assert_eq!(config.temp_critical, 50.0);
        assert_eq!(config.gas_critical, 500.0);
        assert_eq!(config.gas_compound, 400.0);
        assert_eq!(config.vib_high, 60.0);
        assert_eq!(config.window_size, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: DeviceConfig =
            serde_json::from_str(r#"{"temp_high": 45.0, "gas_medium": 260}"#).unwrap();

        assert_eq!(config.temp_high, 45.0);
        assert_eq!(config.gas_medium, 260.0);
        assert_eq!(config.temp_medium, DEFAULT_TEMP_MEDIUM);
        assert_eq!(config.z_threshold, DEFAULT_Z_THRESHOLD);
    }

    #[test]
    fn test_threshold_sets() {
        let config = DeviceConfig::default();
        assert_eq!(config.temperature().critical, Some(50.0));
        assert_eq!(config.vibration().critical, None);
        assert_eq!(config.gas().medium, 250.0);
    }

    #[test]
    fn test_unordered_thresholds_rejected() {
        let config = DeviceConfig {
            temp_high: 25.0,
            ..DeviceConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Unordered("temperature"))
        ));

        let config = DeviceConfig {
            gas_critical: 300.0,
            ..DeviceConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Unordered("gas"))));
    }

    #[test]
    fn test_equal_boundaries_allowed() {
        let set = ThresholdSet::new(10.0, 10.0, 10.0).with_critical(10.0);
        assert!(set.is_ordered());
    }

    #[test]
    fn test_zero_window_rejected() {
        let config = DeviceConfig {
            window_size: 0,
            ..DeviceConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyWindow)));
    }
}
