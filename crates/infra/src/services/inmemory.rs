use super::{DeliveryError, INotifier};
use guild_reminder_domain::WebhookMessage;
use std::sync::Mutex;

/// Notifier used when testing. Records every message instead of sending it.
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, WebhookMessage)>>,
    failing_endpoints: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing_endpoints: Mutex::new(Vec::new()),
        }
    }

    /// Every send to `endpoint` fails from now on. Failed attempts are still recorded.
    pub fn fail_endpoint(&self, endpoint: &str) {
        self.failing_endpoints
            .lock()
            .unwrap()
            .push(endpoint.to_string());
    }

    /// All attempted sends as (endpoint, message) pairs in the order they were made
    pub fn sent(&self) -> Vec<(String, WebhookMessage)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl INotifier for RecordingNotifier {
    async fn send(&self, endpoint: &str, message: &WebhookMessage) -> Result<(), DeliveryError> {
        self.sent
            .lock()
            .unwrap()
            .push((endpoint.to_string(), message.clone()));

        let failing = self
            .failing_endpoints
            .lock()
            .unwrap()
            .iter()
            .any(|e| e == endpoint);
        if failing {
            return Err(DeliveryError::UnexpectedStatus {
                status: 500,
                body: "recording notifier failure".into(),
            });
        }
        Ok(())
    }
}
