//! Builders for the notification intents the workflow publishes.

use lostfound_core::matching::MatchConfidence;
use lostfound_core::notification::NotificationEvent;
use lostfound_db::models::claim::Claim;
use lostfound_db::models::found_item::FoundItem;
use lostfound_db::models::item_match::ItemMatch;
use lostfound_db::models::lost_item::LostItem;
use lostfound_db::models::user::UserContact;
use lostfound_events::PlatformEvent;

/// Tell both the owner and the finder about a high-confidence match.
pub fn match_found(m: &ItemMatch, lost: &LostItem, found: &FoundItem) -> PlatformEvent {
    PlatformEvent::notification(NotificationEvent::MatchFound)
        .with_source("match", m.id)
        .to_user(lost.owner_id)
        .to_user(found.finder_id)
        .with_payload(serde_json::json!({
            "match_id": m.id,
            "lost_item_id": lost.id,
            "lost_item_name": lost.name,
            "found_item_id": found.id,
            "found_item_name": found.name,
            "similarity": m.similarity,
            "match_type": m.match_type,
            "confidence": MatchConfidence::classify(m.similarity),
        }))
}

pub fn claim_received(claim: &Claim, found: &FoundItem) -> PlatformEvent {
    PlatformEvent::notification(NotificationEvent::ClaimReceived)
        .with_source("claim", claim.id)
        .with_actor(claim.claimer_id)
        .to_user(found.finder_id)
        .with_payload(serde_json::json!({
            "claim_id": claim.id,
            "found_item_id": found.id,
            "found_item_name": found.name,
            "match_id": claim.match_id,
        }))
}

/// The approved claimant learns how to reach the finder.
pub fn claim_approved(
    claim: &Claim,
    found: &FoundItem,
    finder: Option<&UserContact>,
) -> PlatformEvent {
    PlatformEvent::notification(NotificationEvent::ClaimApproved)
        .with_source("claim", claim.id)
        .with_actor(found.finder_id)
        .to_user(claim.claimer_id)
        .with_payload(serde_json::json!({
            "claim_id": claim.id,
            "found_item_id": found.id,
            "found_item_name": found.name,
            "finder_contact": finder,
        }))
}

pub fn claim_rejected(claim: &Claim, found: &FoundItem) -> PlatformEvent {
    PlatformEvent::notification(NotificationEvent::ClaimRejected)
        .with_source("claim", claim.id)
        .with_actor(found.finder_id)
        .to_user(claim.claimer_id)
        .with_payload(serde_json::json!({
            "claim_id": claim.id,
            "found_item_id": found.id,
            "found_item_name": found.name,
            "rejection_reason": claim.rejection_reason,
        }))
}
