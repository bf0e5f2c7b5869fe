//! Sensor reading types

use serde::{Deserialize, Serialize};

/// One timestamped snapshot of every monitored sensor on a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub device_id: String,
    /// Degrees Celsius
    pub temperature: f64,
    /// Combustible gas concentration in ppm
    pub gas: f64,
    /// Flame detector, 1 when a flame is seen
    pub flame: u8,
    /// PIR motion detector, 1 when motion is seen
    pub motion: u8,
    /// Vibration frequency in Hz
    pub vibration: f64,
    /// Ultrasonic distance in cm
    pub distance: f64,
    /// Device clock, unix millis
    pub timestamp_millis: i64,
}

impl SensorReading {
    /// Create a reading with every sensor at rest
    pub fn new(device_id: impl Into<String>, timestamp_millis: i64) -> Self {
        Self {
            device_id: device_id.into(),
            temperature: 0.0,
            gas: 0.0,
            flame: 0,
            motion: 0,
            vibration: 0.0,
            distance: 0.0,
            timestamp_millis,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_gas(mut self, gas: f64) -> Self {
        self.gas = gas;
        self
    }

    pub fn with_flame(mut self, flame: u8) -> Self {
        self.flame = flame;
        self
    }

    pub fn with_motion(mut self, motion: u8) -> Self {
        self.motion = motion;
        self
    }

    pub fn with_vibration(mut self, vibration: f64) -> Self {
        self.vibration = vibration;
        self
    }

    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = distance;
        self
    }

    pub fn flame_detected(&self) -> bool {
        self.flame == 1
    }

    pub fn motion_detected(&self) -> bool {
        self.motion == 1
    }
}

/// Sensor values of a canned test scenario
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScenarioValues {
    #[serde(rename = "temperatura")]
    pub temperature: f64,
    pub gas: f64,
    #[serde(rename = "chama")]
    pub flame: u8,
    #[serde(rename = "movimento")]
    pub motion: u8,
    #[serde(rename = "vibracao")]
    pub vibration: f64,
    #[serde(rename = "distancia")]
    pub distance: f64,
}

impl ScenarioValues {
    /// Build a reading for `device_id` from these values
    pub fn to_reading(&self, device_id: &str, timestamp_millis: i64) -> SensorReading {
        SensorReading::new(device_id, timestamp_millis)
            .with_temperature(self.temperature)
            .with_gas(self.gas)
            .with_flame(self.flame)
            .with_motion(self.motion)
            .with_vibration(self.vibration)
            .with_distance(self.distance)
    }
}

/// Named preset used by the test-sensor page
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Scenario {
    #[serde(rename = "nome")]
    pub name: &'static str,
    #[serde(rename = "valores")]
    pub values: ScenarioValues,
}

pub const SCENARIOS: [Scenario; 4] = [
    Scenario {
        name: "Normal",
        values: ScenarioValues {
            temperature: 24.5,
            gas: 180.0,
            flame: 0,
            motion: 0,
            vibration: 12.0,
            distance: 45.0,
        },
    },
    Scenario {
        name: "Atenção",
        values: ScenarioValues {
            temperature: 32.0,
            gas: 270.0,
            flame: 0,
            motion: 1,
            vibration: 35.0,
            distance: 30.0,
        },
    },
    Scenario {
        name: "Alto",
        values: ScenarioValues {
            temperature: 45.0,
            gas: 380.0,
            flame: 0,
            motion: 1,
            vibration: 65.0,
            distance: 15.0,
        },
    },
    Scenario {
        name: "Crítico - Incêndio",
        values: ScenarioValues {
            temperature: 55.0,
            gas: 520.0,
            flame: 1,
            motion: 1,
            vibration: 88.0,
            distance: 10.0,
        },
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_builder() {
        let reading = SensorReading::new("sia-box-01", 1000)
            .with_temperature(24.5)
            .with_flame(1);

        assert_eq!(reading.device_id, "sia-box-01");
        assert_eq!(reading.temperature, 24.5);
        assert_eq!(reading.gas, 0.0);
        assert!(reading.flame_detected());
        assert!(!reading.motion_detected());
    }

    #[test]
    fn test_scenario_to_reading() {
        let reading = SCENARIOS[3].values.to_reading("dev", 42);
        assert_eq!(reading.temperature, 55.0);
        assert_eq!(reading.vibration, 88.0);
        assert_eq!(reading.timestamp_millis, 42);
        assert!(reading.flame_detected());
    }

    #[test]
    fn test_scenario_wire_names() {
        let json = serde_json::to_value(SCENARIOS[0]).unwrap();
        assert_eq!(json["nome"], "Normal");
        assert_eq!(json["valores"]["temperatura"], 24.5);
        assert_eq!(json["valores"]["chama"], 0);
    }
}
