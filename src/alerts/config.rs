//! Alert notification configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Notification target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NotifyTarget {
    /// Log to tracing
    Log,
    /// HTTP webhook
    Webhook {
        url: String,
        #[serde(default)]
        headers: HashMap<String, String>,
    },
}

impl NotifyTarget {
    pub fn webhook(url: impl Into<String>) -> Self {
        NotifyTarget::Webhook {
            url: url.into(),
            headers: HashMap::new(),
        }
    }
}

/// Targets every persisted alert is fanned out to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub targets: Vec<NotifyTarget>,
}

impl NotifyConfig {
    /// Log-only configuration, plus a webhook when `url` is given
    pub fn with_optional_webhook(url: Option<String>) -> Self {
        let mut targets = vec![NotifyTarget::Log];
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            targets.push(NotifyTarget::webhook(url.trim()));
        }
        Self { targets }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            targets: vec![NotifyTarget::Log],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_webhook() {
        let config = NotifyConfig::with_optional_webhook(None);
        assert_eq!(config.targets, vec![NotifyTarget::Log]);

        let config = NotifyConfig::with_optional_webhook(Some("  ".to_string()));
        assert_eq!(config.targets.len(), 1);

        let config = NotifyConfig::with_optional_webhook(Some("http://hooks.local/a".to_string()));
        assert_eq!(config.targets[1], NotifyTarget::webhook("http://hooks.local/a"));
    }

    #[test]
    fn test_target_serde_tag() {
        let json = serde_json::to_value(NotifyTarget::webhook("http://x")).unwrap();
        assert_eq!(json["type"], "Webhook");
        assert_eq!(json["url"], "http://x");

        let target: NotifyTarget = serde_json::from_str(r#"{"type":"Log"}"#).unwrap();
        assert_eq!(target, NotifyTarget::Log);
    }
}
