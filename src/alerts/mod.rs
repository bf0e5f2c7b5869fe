//! Alert notifications
//!
//! Every alert the store persists is pushed to subscribers and fanned out to
//! the configured notification targets.

pub mod config;
pub mod dispatcher;
pub mod notifier;

pub use config::{NotifyConfig, NotifyTarget};
pub use dispatcher::AlertDispatcher;
pub use notifier::{Notifier, NotifierError, DEFAULT_WEBHOOK_TIMEOUT};
