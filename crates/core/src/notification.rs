//! Notification intents emitted by the workflow.
//!
//! The core only decides *that* a user should be told something and *what*;
//! delivery belongs to the notification gateway.

use serde::{Deserialize, Serialize};

/// Kinds of user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    /// A lost and a found item were matched with high confidence.
    MatchFound,
    /// A finder received a claim on their found item.
    ClaimReceived,
    /// A claimant's claim was approved (payload carries finder contact).
    ClaimApproved,
    /// A claimant's claim was rejected (payload carries the reason).
    ClaimRejected,
}

impl NotificationEvent {
    pub const ALL: &'static [NotificationEvent] = &[
        NotificationEvent::MatchFound,
        NotificationEvent::ClaimReceived,
        NotificationEvent::ClaimApproved,
        NotificationEvent::ClaimRejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NotificationEvent::MatchFound => "match_found",
            NotificationEvent::ClaimReceived => "claim_received",
            NotificationEvent::ClaimApproved => "claim_approved",
            NotificationEvent::ClaimRejected => "claim_rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.as_str() == value)
    }
}

impl std::fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
