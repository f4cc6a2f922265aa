//! Webhook notification gateway with exponential-backoff retry.
//!
//! [`WebhookGateway`] POSTs one JSON document per recipient to the delivery
//! service. Failed attempts are retried with backoff (1 s, 2 s, 4 s by
//! default) before the notification is reported as undelivered.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use lostfound_core::notification::NotificationEvent;
use lostfound_core::types::DbId;

use crate::gateway::NotificationGateway;

/// Default retry delays (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// Network, DNS, or timeout failure.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

/// Delivers notifications to a single webhook endpoint.
pub struct WebhookGateway {
    client: reqwest::Client,
    url: String,
    retry_delays: Vec<Duration>,
}

impl WebhookGateway {
    pub fn new(url: impl Into<String>) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            retry_delays: RETRY_DELAYS.to_vec(),
        })
    }

    /// Override the backoff schedule. An empty schedule means one attempt.
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Deliver one payload, retrying on failure.
    pub async fn deliver(&self, body: &serde_json::Value) -> Result<(), WebhookError> {
        for (attempt, delay) in self.retry_delays.iter().enumerate() {
            match self.try_send(body).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        url = %self.url,
                        error = %e,
                        "Webhook delivery attempt failed, retrying"
                    );
                    tokio::time::sleep(*delay).await;
                }
            }
        }

        // Final attempt after the last backoff.
        self.try_send(body).await.inspect_err(|e| {
            tracing::error!(url = %self.url, error = %e, "Webhook delivery failed after all retries");
        })
    }

    async fn try_send(&self, body: &serde_json::Value) -> Result<(), WebhookError> {
        let response = self.client.post(&self.url).json(body).send().await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

/// The JSON document sent for one notification.
pub fn webhook_body(
    user_id: DbId,
    event: NotificationEvent,
    payload: &serde_json::Value,
) -> serde_json::Value {
    serde_json::json!({
        "user_id": user_id,
        "event_type": event.as_str(),
        "payload": payload,
        "timestamp": Utc::now(),
    })
}

#[async_trait]
impl NotificationGateway for WebhookGateway {
    async fn notify(
        &self,
        user_id: DbId,
        event: NotificationEvent,
        payload: &serde_json::Value,
    ) -> bool {
        self.deliver(&webhook_body(user_id, event, payload))
            .await
            .is_ok()
    }
}
