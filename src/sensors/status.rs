//! Dashboard status summaries
//!
//! The overview badge and the per-metric gauges use their own coarse rules,
//! independent of the ingestion classifier.

use serde::Serialize;

use super::classifier::AlertLevel;
use super::reading::SensorReading;
use super::thresholds::{DeviceConfig, ThresholdSet};

const BINARY_BANDS: ThresholdSet = ThresholdSet::new(0.0, 0.0, 1.0);
const DISTANCE_BANDS: ThresholdSet = ThresholdSet::new(30.0, 20.0, 10.0);

/// Overall status badge shown on the dashboard header
pub fn overall_status(reading: &SensorReading) -> AlertLevel {
    if reading.flame_detected() || reading.temperature > 50.0 || reading.gas > 400.0 {
        AlertLevel::Critical
    } else if reading.temperature > 35.0 || reading.gas > 300.0 || reading.vibration > 60.0 {
        AlertLevel::High
    } else if reading.temperature > 30.0 || reading.gas > 200.0 || reading.vibration > 30.0 {
        AlertLevel::Attention
    } else {
        AlertLevel::Normal
    }
}

/// Color band of a single gauge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Ok,
    Warning,
    Danger,
}

/// Place a value into its band; comparisons are inclusive
pub fn band(value: f64, thresholds: &ThresholdSet) -> Band {
    if value >= thresholds.high {
        Band::Danger
    } else if value >= thresholds.medium {
        Band::Warning
    } else {
        Band::Ok
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Gauge {
    pub metric: &'static str,
    pub value: f64,
    pub unit: &'static str,
    pub band: Band,
    pub thresholds: ThresholdSet,
}

/// Gauges for every sensor of a reading, in dashboard order
pub fn gauges(reading: &SensorReading, config: &DeviceConfig) -> Vec<Gauge> {
    let gauge = |metric: &'static str, value: f64, unit: &'static str, thresholds: ThresholdSet| Gauge {
        metric,
        value,
        unit,
        band: band(value, &thresholds),
        thresholds,
    };

    let temperature = config.temperature();
    let gas = config.gas();

    vec![
        gauge(
            "temperatura",
            reading.temperature,
            "°C",
            ThresholdSet::new(temperature.low, temperature.medium, temperature.high),
        ),
        gauge(
            "gas",
            reading.gas,
            "ppm",
            ThresholdSet::new(gas.low, gas.medium, gas.high),
        ),
        gauge("chama", f64::from(reading.flame), "", BINARY_BANDS),
        gauge("vibracao", reading.vibration, "Hz", config.vibration()),
        gauge("movimento", f64::from(reading.motion), "", BINARY_BANDS),
        gauge("distancia", reading.distance, "cm", DISTANCE_BANDS),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(temperature: f64, gas: f64, vibration: f64) -> SensorReading {
        SensorReading::new("dev", 0)
            .with_temperature(temperature)
            .with_gas(gas)
            .with_vibration(vibration)
    }

    #[test]
    fn test_overall_status() {
        assert_eq!(overall_status(&reading(24.5, 180.0, 12.0)), AlertLevel::Normal);
        assert_eq!(overall_status(&reading(20.0, 100.0, 31.0)), AlertLevel::Attention);
        assert_eq!(overall_status(&reading(36.0, 100.0, 0.0)), AlertLevel::High);
        assert_eq!(overall_status(&reading(20.0, 401.0, 0.0)), AlertLevel::Critical);
        assert_eq!(
            overall_status(&reading(10.0, 0.0, 0.0).with_flame(1)),
            AlertLevel::Critical
        );
    }

    #[test]
    fn test_overall_status_differs_from_classifier() {
        // Badge escalates vibration alone, the classifier does not
        let r = reading(20.0, 100.0, 61.0);
        assert_eq!(overall_status(&r), AlertLevel::High);
        let alert = crate::sensors::classify(&r, &DeviceConfig::default());
        assert_eq!(alert.level, AlertLevel::Normal);
    }

    #[test]
    fn test_band_is_inclusive() {
        let set = ThresholdSet::new(20.0, 30.0, 40.0);
        assert_eq!(band(29.9, &set), Band::Ok);
        assert_eq!(band(30.0, &set), Band::Warning);
        assert_eq!(band(40.0, &set), Band::Danger);
    }

    #[test]
    fn test_gauges() {
        let r = reading(24.5, 260.0, 12.0).with_flame(1).with_distance(8.0);
        let gauges = gauges(&r, &DeviceConfig::default());

        assert_eq!(gauges.len(), 6);
        assert_eq!(gauges[0].metric, "temperatura");
        assert_eq!(gauges[0].band, Band::Ok);
        assert!(gauges[0].thresholds.critical.is_none());
        assert_eq!(gauges[1].band, Band::Warning);
        assert_eq!(gauges[2].band, Band::Danger);
        assert_eq!(gauges[4].band, Band::Warning);
        // Distance bands are reversed: only far readings reach danger
        assert_eq!(gauges[5].band, Band::Ok);

        let far = reading(24.5, 180.0, 12.0).with_distance(45.0);
        assert_eq!(super::gauges(&far, &DeviceConfig::default())[5].band, Band::Danger);
    }
}
