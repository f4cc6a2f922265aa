//! Drains notification intents from the event bus into a gateway.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::bus::PlatformEvent;
use crate::gateway::NotificationGateway;

/// Delivers every notification-intent event to each of its recipients.
///
/// Delivery failures are logged and dropped; the mutation that produced
/// the event has already committed.
pub struct NotificationDispatcher {
    gateway: Arc<dyn NotificationGateway>,
}

impl NotificationDispatcher {
    pub fn new(gateway: Arc<dyn NotificationGateway>) -> Self {
        Self { gateway }
    }

    /// Run until the bus is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    self.dispatch(&event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification dispatcher lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification dispatcher shutting down");
                    break;
                }
            }
        }
    }

    /// Deliver one event. Returns how many recipients the gateway accepted.
    pub async fn dispatch(&self, event: &PlatformEvent) -> usize {
        let Some(kind) = event.notification_kind() else {
            return 0;
        };

        let mut delivered = 0;
        for &user_id in &event.recipients {
            if self.gateway.notify(user_id, kind, &event.payload).await {
                delivered += 1;
            } else {
                tracing::warn!(
                    user_id,
                    event_type = %event.event_type,
                    source_entity_id = ?event.source_entity_id,
                    "Notification not delivered"
                );
            }
        }
        delivered
    }
}
