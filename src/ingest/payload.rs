//! Inbound sensor payload as sent by the field devices

use serde::Deserialize;

use super::handler::IngestError;
use crate::sensors::SensorReading;

/// Raw body of a device report. Every field is optional on the wire so
/// validation can tell a missing field from a malformed request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestPayload {
    #[serde(rename = "deviceId")]
    pub device_id: Option<String>,
    #[serde(rename = "temperatura")]
    pub temperature: Option<f64>,
    pub gas: Option<f64>,
    #[serde(rename = "chama")]
    pub flame: Option<f64>,
    #[serde(rename = "movimento")]
    pub motion: Option<f64>,
    #[serde(rename = "vibracao")]
    pub vibration: Option<f64>,
    #[serde(rename = "distancia")]
    pub distance: Option<f64>,
    pub timestamp: Option<i64>,
}

impl IngestPayload {
    /// Validate and build a reading. Absent optional sensors read as 0 and an
    /// absent timestamp takes `now_millis`.
    pub fn into_reading(self, now_millis: i64) -> Result<SensorReading, IngestError> {
        let device_id = match self.device_id {
            Some(id) if !id.is_empty() => id,
            _ => return Err(IngestError::InvalidPayload("deviceId is required")),
        };
        let temperature = self
            .temperature
            .ok_or(IngestError::InvalidPayload("temperatura is required"))?;

        Ok(SensorReading {
            device_id,
            temperature,
            gas: self.gas.unwrap_or(0.0),
            flame: as_flag(self.flame),
            motion: as_flag(self.motion),
            vibration: self.vibration.unwrap_or(0.0),
            distance: self.distance.unwrap_or(0.0),
            timestamp_millis: self.timestamp.unwrap_or(now_millis),
        })
    }
}

/// A detector reports an event only with exactly 1; anything else reads as 0
fn as_flag(value: Option<f64>) -> u8 {
    match value {
        Some(v) if v == 1.0 => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> IngestPayload {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_full_payload() {
        let payload = parse(serde_json::json!({
            "deviceId": "sia-box-01",
            "temperatura": 24.5,
            "gas": 180,
            "chama": 0,
            "movimento": 1,
            "vibracao": 12,
            "distancia": 45,
            "timestamp": 1700000000000i64
        }));

        let reading = payload.into_reading(0).unwrap();
        assert_eq!(reading.device_id, "sia-box-01");
        assert_eq!(reading.temperature, 24.5);
        assert_eq!(reading.gas, 180.0);
        assert_eq!(reading.motion, 1);
        assert_eq!(reading.timestamp_millis, 1700000000000);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let payload = parse(serde_json::json!({
            "deviceId": "sia-box-01",
            "temperatura": 30
        }));

        let reading = payload.into_reading(77).unwrap();
        assert_eq!(reading.gas, 0.0);
        assert_eq!(reading.flame, 0);
        assert_eq!(reading.vibration, 0.0);
        assert_eq!(reading.timestamp_millis, 77);
    }

    #[test]
    fn test_missing_device_id() {
        let payload = parse(serde_json::json!({ "temperatura": 30 }));
        assert!(matches!(
            payload.into_reading(0),
            Err(IngestError::InvalidPayload(_))
        ));

        let payload = parse(serde_json::json!({ "deviceId": "", "temperatura": 30 }));
        assert!(matches!(
            payload.into_reading(0),
            Err(IngestError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_missing_temperature() {
        let payload = parse(serde_json::json!({ "deviceId": "sia-box-01", "gas": 100 }));
        assert!(matches!(
            payload.into_reading(0),
            Err(IngestError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_zero_temperature_is_present() {
        let payload = parse(serde_json::json!({ "deviceId": "d", "temperatura": 0 }));
        assert!(payload.into_reading(0).is_ok());
    }

    #[test]
    fn test_flag_conversion() {
        assert_eq!(as_flag(Some(1.0)), 1);
        assert_eq!(as_flag(Some(0.0)), 0);
        assert_eq!(as_flag(Some(-3.0)), 0);
        assert_eq!(as_flag(None), 0);
    }

    #[test]
    fn test_non_unit_flame_is_not_fire() {
        for chama in [1.5, 2.0, 0.999] {
            let payload = parse(serde_json::json!({
                "deviceId": "d",
                "temperatura": 20,
                "gas": 0,
                "chama": chama
            }));

            let reading = payload.into_reading(0).unwrap();
            assert_eq!(reading.flame, 0, "chama = {}", chama);
            assert!(!reading.flame_detected());
        }
    }
}
