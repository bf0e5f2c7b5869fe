//! Device report ingestion
//!
//! Reports arrive over HTTP (see `api`) or from the built-in simulator and
//! flow through the same `Ingestor`.

pub mod handler;
pub mod payload;

pub use handler::{IngestError, IngestOutcome, Ingestor, DEFAULT_STORE_TIMEOUT};
pub use payload::IngestPayload;
