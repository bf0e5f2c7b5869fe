use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::ingest::{IngestError, IngestPayload, Ingestor};
use crate::sensors::{
    gauges, overall_status, AlertDescriptor, AlertLevel, DeviceConfig, Gauge, Scenario, SCENARIOS,
};
use crate::storage::{AlertFilter, AlertRecord, Device, ReadingRecord, StorageEngine, StorageError};

/// Default page size for reading and alert listings
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Application state shared across handlers
pub struct AppState {
    pub engine: Arc<StorageEngine>,
    pub ingestor: Ingestor,
}

impl AppState {
    pub fn new(engine: Arc<StorageEngine>, ingestor: Ingestor) -> Self {
        Self { engine, ingestor }
    }

    fn require_device(&self, device_id: &str) -> Result<(), ApiError> {
        if self.engine.has_device(device_id) {
            Ok(())
        } else {
            Err(ApiError::NotFound(format!(
                "Dispositivo não encontrado: {}",
                device_id
            )))
        }
    }
}

// ============================================================================
// Health Check
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================================
// Ingest
// ============================================================================

#[derive(Serialize)]
pub struct IngestResponse {
    pub success: bool,
    pub message: &'static str,
    #[serde(rename = "alerta")]
    pub alert: AlertDescriptor,
}

pub async fn ingest_reading(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<IngestPayload>, JsonRejection>,
) -> Result<Json<IngestResponse>, ApiError> {
    let payload = json_body(payload)?;
    let outcome = state.ingestor.ingest(payload).await?;

    Ok(Json(IngestResponse {
        success: true,
        message: "Dados recebidos",
        alert: outcome.alert,
    }))
}

// ============================================================================
// Devices
// ============================================================================

#[derive(Serialize)]
pub struct DevicesResponse {
    pub devices: Vec<Device>,
}

pub async fn list_devices(State(state): State<Arc<AppState>>) -> Json<DevicesResponse> {
    Json(DevicesResponse {
        devices: state.engine.list_devices(),
    })
}

#[derive(Deserialize)]
pub struct RegisterDeviceRequest {
    pub device_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

pub async fn register_device(
    State(state): State<Arc<AppState>>,
    request: Result<Json<RegisterDeviceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Device>), ApiError> {
    let request = json_body(request)?;
    let device_id = request.device_id.trim();
    if device_id.is_empty() {
        return Err(ApiError::BadRequest("device_id is required".to_string()));
    }

    let name = request.name.unwrap_or_else(|| device_id.to_string());
    let mut device = Device::new(device_id, name);
    device.location = request.location;

    state.engine.register_device(device.clone())?;
    tracing::info!(device_id = %device.device_id, "Device registered");

    Ok((StatusCode::CREATED, Json(device)))
}

// ============================================================================
// Threshold Configuration
// ============================================================================

pub async fn get_config(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
) -> Result<Json<DeviceConfig>, ApiError> {
    state.require_device(&device_id)?;
    Ok(Json(state.engine.resolved_config(&device_id)))
}

pub async fn update_config(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
    config: Result<Json<DeviceConfig>, JsonRejection>,
) -> Result<Json<DeviceConfig>, ApiError> {
    state.require_device(&device_id)?;
    let config = json_body(config)?;
    config
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    state.engine.save_config(&device_id, config.clone())?;
    tracing::info!(device_id = %device_id, "Threshold configuration saved");

    Ok(Json(config))
}

// ============================================================================
// Readings & Status
// ============================================================================

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub filter: Option<String>,
}

impl ListParams {
    fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIST_LIMIT)
    }
}

#[derive(Serialize)]
pub struct ReadingsResponse {
    pub device_id: String,
    pub readings: Vec<ReadingRecord>,
}

pub async fn list_readings(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<ReadingsResponse>, ApiError> {
    state.require_device(&device_id)?;
    let readings = state.engine.latest_readings(&device_id, params.limit());
    Ok(Json(ReadingsResponse {
        device_id,
        readings,
    }))
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub device_id: String,
    /// Overall badge, `None` until the device reports
    pub status: Option<AlertLevel>,
    pub latest: Option<ReadingRecord>,
    pub gauges: Vec<Gauge>,
    pub unread_alerts: usize,
}

pub async fn device_status(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.require_device(&device_id)?;

    let latest = state.engine.latest_reading(&device_id);
    let config = state.engine.resolved_config(&device_id);

    let (status, gauges) = match &latest {
        Some(record) => (
            Some(overall_status(&record.reading)),
            gauges(&record.reading, &config),
        ),
        None => (None, Vec::new()),
    };

    Ok(Json(StatusResponse {
        unread_alerts: state.engine.unread_count(&device_id),
        device_id,
        status,
        latest,
        gauges,
    }))
}

// ============================================================================
// Alerts
// ============================================================================

#[derive(Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<AlertRecord>,
    pub unread: usize,
}

pub async fn list_alerts(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<AlertsResponse>, ApiError> {
    state.require_device(&device_id)?;

    let filter = match params.filter.as_deref() {
        Some(raw) => raw
            .parse::<AlertFilter>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => AlertFilter::All,
    };

    Ok(Json(AlertsResponse {
        alerts: state.engine.list_alerts(&device_id, filter, params.limit()),
        unread: state.engine.unread_count(&device_id),
    }))
}

pub async fn mark_alert_read(
    State(state): State<Arc<AppState>>,
    Path(alert_id): Path<String>,
) -> Result<Json<AlertRecord>, ApiError> {
    Ok(Json(state.engine.mark_alert_read(&alert_id)?))
}

#[derive(Serialize)]
pub struct MarkedResponse {
    pub marked: usize,
}

pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
) -> Result<Json<MarkedResponse>, ApiError> {
    state.require_device(&device_id)?;
    Ok(Json(MarkedResponse {
        marked: state.engine.mark_all_read(&device_id),
    }))
}

/// Server-sent `alert` event for every inserted alert
pub async fn alert_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let receiver = state.engine.subscribe_alerts();

    let events = stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(alert) => {
                    let event = Event::default().event("alert").json_data(&alert);
                    return Some((event, receiver));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Alert stream subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

// ============================================================================
// Scenarios
// ============================================================================

pub async fn list_scenarios() -> Json<&'static [Scenario]> {
    Json(&SCENARIOS)
}

// ============================================================================
// Error Handling
// ============================================================================

/// Unwrap a JSON body, turning axum's rejection into an `{"error"}` response
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(e) => {
            tracing::warn!(error = %e, "Rejected malformed request body");
            Err(ApiError::BadRequest(format!("Dados inválidos: {}", e.body_text())))
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::InvalidPayload(_) => ApiError::BadRequest(err.to_string()),
            IngestError::DeviceNotFound(_) => ApiError::NotFound(err.to_string()),
            IngestError::Storage(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::DeviceNotFound(_) | StorageError::AlertNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            StorageError::DeviceExists(_) => ApiError::Conflict(err.to_string()),
            StorageError::Timeout(_) | StorageError::Unavailable(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
