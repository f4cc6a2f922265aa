//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` across the application.

use chrono::{DateTime, Utc};
use lostfound_core::notification::NotificationEvent;
use lostfound_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// PlatformEvent
// ---------------------------------------------------------------------------

/// A domain event addressed to zero or more users.
///
/// Built with [`PlatformEvent::new`] or [`PlatformEvent::notification`] and
/// the `with_*` builder methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// Event name, e.g. `"match_found"`.
    pub event_type: String,

    /// Source entity kind (`"match"`, `"claim"`).
    pub source_entity_type: Option<String>,

    pub source_entity_id: Option<DbId>,

    /// User whose action triggered the event, if any.
    pub actor_user_id: Option<DbId>,

    /// Users the event should be delivered to.
    pub recipients: Vec<DbId>,

    /// Event-specific data.
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl PlatformEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source_entity_type: None,
            source_entity_id: None,
            actor_user_id: None,
            recipients: Vec::new(),
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Start a notification-intent event of a known kind.
    pub fn notification(kind: NotificationEvent) -> Self {
        Self::new(kind.as_str())
    }

    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id);
        self
    }

    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    /// Add a recipient. Duplicates are ignored.
    pub fn to_user(mut self, user_id: DbId) -> Self {
        if !self.recipients.contains(&user_id) {
            self.recipients.push(user_id);
        }
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// The notification kind, if this event is a notification intent.
    pub fn notification_kind(&self) -> Option<NotificationEvent> {
        NotificationEvent::parse(&self.event_type)
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use lostfound_events::bus::{EventBus, PlatformEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(PlatformEvent::new("claim_received").to_user(7));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest messages are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers. Dropped silently when
    /// nobody is listening.
    pub fn publish(&self, event: PlatformEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!("Event published with no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            PlatformEvent::notification(NotificationEvent::MatchFound)
                .with_source("match", 42)
                .to_user(1)
                .to_user(2)
                .with_payload(serde_json::json!({"similarity": 0.92})),
        );

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event_type, "match_found");
        assert_eq!(received.source_entity_id, Some(42));
        assert_eq!(received.recipients, vec![1, 2]);
        assert_eq!(received.payload["similarity"], 0.92);
        assert_eq!(
            received.notification_kind(),
            Some(NotificationEvent::MatchFound)
        );
    }

    #[tokio::test]
    async fn every_subscriber_sees_each_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(PlatformEvent::new("claim_received"));

        assert_eq!(rx1.recv().await.unwrap().event_type, "claim_received");
        assert_eq!(rx2.recv().await.unwrap().event_type, "claim_received");
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        EventBus::default().publish(PlatformEvent::new("claim_rejected"));
    }

    #[test]
    fn recipients_are_deduplicated() {
        let event = PlatformEvent::new("match_found").to_user(3).to_user(3);
        assert_eq!(event.recipients, vec![3]);
    }

    #[test]
    fn unknown_event_type_is_not_a_notification() {
        assert!(PlatformEvent::new("item.created").notification_kind().is_none());
    }
}
