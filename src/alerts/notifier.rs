//! Notification handlers for alerts

use std::collections::HashMap;
use std::time::Duration;

use super::config::NotifyTarget;
use crate::storage::AlertRecord;

/// Upper bound on a single webhook delivery
pub const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

/// Notifier for sending alert notifications
pub struct Notifier {
    client: reqwest::Client,
    timeout: Duration,
}

impl Notifier {
    /// Create a new notifier
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: DEFAULT_WEBHOOK_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send notification to all targets
    pub async fn notify(
        &self,
        alert: &AlertRecord,
        targets: &[NotifyTarget],
    ) -> Result<(), NotifierError> {
        let mut errors = Vec::new();

        for target in targets {
            if let Err(e) = self.notify_target(alert, target).await {
                errors.push(e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(NotifierError::Multiple(errors))
        }
    }

    /// Send notification to a single target
    async fn notify_target(
        &self,
        alert: &AlertRecord,
        target: &NotifyTarget,
    ) -> Result<(), NotifierError> {
        match target {
            NotifyTarget::Log => {
                tracing::warn!(
                    alert_id = %alert.id,
                    device_id = %alert.device_id,
                    level = %alert.level,
                    cause = %alert.cause,
                    "Alert raised: {}",
                    alert.message
                );
                Ok(())
            }
            NotifyTarget::Webhook { url, headers } => self.send_webhook(alert, url, headers).await,
        }
    }

    /// Send webhook notification
    async fn send_webhook(
        &self,
        alert: &AlertRecord,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<(), NotifierError> {
        let payload = serde_json::json!({
            "alert_id": alert.id,
            "device_id": alert.device_id,
            "level": alert.level,
            "message": alert.message,
            "cause": alert.cause,
            "action": alert.action,
            "created_at": alert.created_at.to_rfc3339(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let mut request = self.client.post(url).timeout(self.timeout).json(&payload);

        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| NotifierError::Webhook(format!("Failed to send webhook: {}", e)))?;

        if !response.status().is_success() {
            return Err(NotifierError::Webhook(format!(
                "Webhook returned status {}",
                response.status()
            )));
        }

        tracing::debug!(
            alert_id = %alert.id,
            url = %url,
            "Webhook notification sent"
        );

        Ok(())
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Notifier errors
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("Webhook error: {0}")]
    Webhook(String),

    #[error("Multiple notification failures: {0:?}")]
    Multiple(Vec<NotifierError>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::AlertLevel;

    fn record() -> AlertRecord {
        AlertRecord {
            id: "a-1".to_string(),
            device_id: "sia-box-01".to_string(),
            level: AlertLevel::High,
            message: "Temperatura elevada detectada".to_string(),
            cause: "Temperatura: 45°C".to_string(),
            action: "Verificar resfriamento".to_string(),
            read: false,
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_log_notification() {
        let notifier = Notifier::new();

        // Log notification should always succeed
        let result = notifier.notify(&record(), &[NotifyTarget::Log]).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_webhook_fails() {
        let notifier = Notifier::new();

        // Port 9 on loopback refuses connections
        let targets = [NotifyTarget::Log, NotifyTarget::webhook("http://127.0.0.1:9/hook")];
        let result = notifier.notify(&record(), &targets).await;

        match result {
            Err(NotifierError::Multiple(errors)) => {
                assert_eq!(errors.len(), 1);
                assert!(matches!(errors[0], NotifierError::Webhook(_)));
            }
            other => panic!("expected webhook failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_silent_webhook_times_out() {
        // Accepts connections but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let notifier = Notifier::new().with_timeout(Duration::from_millis(100));
        let target = NotifyTarget::webhook(format!("http://{}/hook", addr));

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            notifier.notify(&record(), &[target]),
        )
        .await
        .expect("webhook delivery should give up on its own");

        assert!(matches!(result, Err(NotifierError::Multiple(_))));
        server.abort();
    }
}
