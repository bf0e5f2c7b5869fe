//! Simulated sensor drift
//!
//! `drift_step` is a pure time step from one reading to the next; the
//! `SimulatorWorker` drives it on an interval and feeds every reading through
//! the regular ingestion path.

use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

use super::reading::{SensorReading, SCENARIOS};
use crate::ingest::{IngestPayload, Ingestor};

/// Produce the next simulated reading from the previous one
pub fn drift_step<R: Rng>(
    prev: &SensorReading,
    now_millis: i64,
    rng: &mut R,
) -> SensorReading {
    let mut jitter = |span: f64| (rng.gen::<f64>() - 0.5) * span;

    let temperature = prev.temperature + jitter(2.0);
    let gas = (prev.gas + jitter(50.0)).max(0.0);
    let vibration = (prev.vibration + jitter(10.0)).max(0.0);
    let distance = (prev.distance + jitter(5.0)).clamp(5.0, 100.0);

    SensorReading {
        device_id: prev.device_id.clone(),
        temperature,
        gas,
        flame: u8::from(rng.gen::<f64>() > 0.95),
        motion: u8::from(rng.gen::<f64>() > 0.7),
        vibration,
        distance,
        timestamp_millis: now_millis,
    }
}

/// Background worker that reports simulated readings for one device
pub struct SimulatorWorker {
    ingestor: Ingestor,
    device_id: String,
    interval: Duration,
    running: Arc<AtomicBool>,
}

impl SimulatorWorker {
    pub fn new(ingestor: Ingestor, device_id: impl Into<String>, interval: Duration) -> Self {
        Self {
            ingestor,
            device_id: device_id.into(),
            interval,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the background worker
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            tracing::info!(
                device_id = %self.device_id,
                "Simulator started with interval {:?}",
                self.interval
            );

            let mut interval = time::interval(self.interval);
            let mut current = SCENARIOS[0]
                .values
                .to_reading(&self.device_id, chrono::Utc::now().timestamp_millis());

            while self.running.load(Ordering::SeqCst) {
                interval.tick().await;

                let now = chrono::Utc::now().timestamp_millis();
                current = drift_step(&current, now, &mut rand::thread_rng());

                match self.ingestor.ingest(to_payload(&current)).await {
                    Ok(outcome) => {
                        if !outcome.alert.level.is_normal() {
                            tracing::info!(
                                device_id = %self.device_id,
                                level = %outcome.alert.level,
                                "Simulated reading raised an alert"
                            );
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            device_id = %self.device_id,
                            error = %e,
                            "Simulated reading rejected"
                        );
                    }
                }
            }

            tracing::info!("Simulator stopped");
        })
    }

    /// Stop the worker
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if worker is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

fn to_payload(reading: &SensorReading) -> IngestPayload {
    IngestPayload {
        device_id: Some(reading.device_id.clone()),
        temperature: Some(reading.temperature),
        gas: Some(reading.gas),
        flame: Some(f64::from(reading.flame)),
        motion: Some(f64::from(reading.motion)),
        vibration: Some(reading.vibration),
        distance: Some(reading.distance),
        timestamp: Some(reading.timestamp_millis),
    }
}
