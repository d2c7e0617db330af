mod discord_webhook;
mod inmemory;

use guild_reminder_domain::WebhookMessage;
use thiserror::Error;

pub use discord_webhook::DiscordWebhookNotifier;
pub use inmemory::RecordingNotifier;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Invalid webhook endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("Webhook request failed: {0}")]
    Transport(String),
    #[error("Webhook responded with status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}

/// Delivers reminder messages to a guild endpoint
#[async_trait::async_trait]
pub trait INotifier: Send + Sync {
    async fn send(&self, endpoint: &str, message: &WebhookMessage) -> Result<(), DeliveryError>;
}
