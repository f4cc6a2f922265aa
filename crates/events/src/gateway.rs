//! Outbound notification seam.
//!
//! Delivery (email, WhatsApp, push) is owned by an external service. The
//! core decides that a user should hear about something and hands it to a
//! [`NotificationGateway`]; failures are reported, never raised.

use async_trait::async_trait;
use lostfound_core::notification::NotificationEvent;
use lostfound_core::types::DbId;

/// Delivers a single notification to a single user.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// Returns whether the gateway accepted the notification.
    async fn notify(
        &self,
        user_id: DbId,
        event: NotificationEvent,
        payload: &serde_json::Value,
    ) -> bool;
}

/// Gateway that only logs. Used when no delivery endpoint is configured.
#[derive(Debug, Default, Clone)]
pub struct LogGateway;

#[async_trait]
impl NotificationGateway for LogGateway {
    async fn notify(
        &self,
        user_id: DbId,
        event: NotificationEvent,
        payload: &serde_json::Value,
    ) -> bool {
        tracing::info!(user_id, event = %event, %payload, "Notification");
        true
    }
}
