//! Sensor domain: readings, thresholds and severity classification

pub mod classifier;
pub mod reading;
pub mod simulator;
pub mod status;
pub mod thresholds;

pub use classifier::{classify, AlertDescriptor, AlertLevel, UnknownLevel};
pub use reading::{Scenario, ScenarioValues, SensorReading, SCENARIOS};
pub use simulator::{drift_step, SimulatorWorker};
pub use status::{gauges, overall_status, Band, Gauge};
pub use thresholds::{ConfigError, DeviceConfig, ThresholdSet};
