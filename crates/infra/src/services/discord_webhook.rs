use super::{DeliveryError, INotifier};
use guild_reminder_domain::WebhookMessage;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Executes Discord webhooks. A webhook only counts as delivered when it
/// answers with `204 No Content`, failed deliveries are not retried.
pub struct DiscordWebhookNotifier {
    client: Client,
}

impl DiscordWebhookNotifier {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for DiscordWebhookNotifier {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, DeliveryError> {
    let invalid = |reason: String| DeliveryError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };
    let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
    let allowed_schemes = ["https", "http"];
    if !allowed_schemes.contains(&url.scheme()) {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    Ok(url)
}

#[async_trait::async_trait]
impl INotifier for DiscordWebhookNotifier {
    async fn send(&self, endpoint: &str, message: &WebhookMessage) -> Result<(), DeliveryError> {
        let url = parse_endpoint(endpoint)?;

        let response = self
            .client
            .post(url)
            .json(message)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message() -> WebhookMessage {
        WebhookMessage {
            content: "@everyone Guild War - Bring potions".into(),
            embeds: Vec::new(),
        }
    }

    #[tokio::test]
    async fn it_posts_message_as_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/webhooks/1/token"))
            .and(body_json(&message()))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = DiscordWebhookNotifier::new();
        let endpoint = format!("{}/api/webhooks/1/token", server.uri());
        assert_eq!(notifier.send(&endpoint, &message()).await, Ok(()));
    }

    #[tokio::test]
    async fn only_no_content_counts_as_delivered() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let notifier = DiscordWebhookNotifier::new();
        let res = notifier.send(&server.uri(), &message()).await;
        assert!(matches!(
            res,
            Err(DeliveryError::UnexpectedStatus { status: 200, .. })
        ));
    }

    #[tokio::test]
    async fn failure_keeps_response_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Unknown Webhook"))
            .mount(&server)
            .await;

        let notifier = DiscordWebhookNotifier::new();
        let res = notifier.send(&server.uri(), &message()).await;
        assert_eq!(
            res,
            Err(DeliveryError::UnexpectedStatus {
                status: 404,
                body: "Unknown Webhook".into()
            })
        );
    }

    #[tokio::test]
    async fn it_rejects_invalid_endpoints() {
        let notifier = DiscordWebhookNotifier::new();
        for endpoint in &["not a url", "ftp://example.com/hook", ""] {
            let res = notifier.send(endpoint, &message()).await;
            assert!(
                matches!(res, Err(DeliveryError::InvalidEndpoint { .. })),
                "{} was accepted",
                endpoint
            );
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let notifier = DiscordWebhookNotifier::new();
        let res = notifier.send("http://127.0.0.1:1/hook", &message()).await;
        assert!(matches!(res, Err(DeliveryError::Transport(_))));
    }
}
