//! Claim workflow rules.
//!
//! Precondition checks and review validation shared by the claim workflow
//! and the HTTP layer. Everything here is pure; persistence happens in the
//! workflow crate.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::{ClaimStatus, FoundItemStatus, StatusTransitions};
use crate::types::DbId;

/// Maximum length of a claim story.
pub const MAX_STORY_LEN: usize = 2000;

/// Maximum length of a rejection reason.
pub const MAX_REJECTION_REASON_LEN: usize = 500;

/// Reason recorded on pending claims rejected because another claim won.
pub const SUPERSEDED_REJECTION_REASON: &str = "Another claim for this item was approved";

/// A finder's decision on a pending claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Approve,
    Reject,
}

/// A validated review: the target status plus the normalised reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDecision {
    pub status: ClaimStatus,
    pub rejection_reason: Option<String>,
}

/// Validate a review request.
///
/// Rejections require a non-blank reason; approvals discard any reason sent.
pub fn validate_review(
    action: ReviewAction,
    rejection_reason: Option<&str>,
) -> Result<ReviewDecision, CoreError> {
    match action {
        ReviewAction::Approve => Ok(ReviewDecision {
            status: ClaimStatus::Approved,
            rejection_reason: None,
        }),
        ReviewAction::Reject => {
            let reason = rejection_reason.map(str::trim).unwrap_or_default();
            if reason.is_empty() {
                return Err(CoreError::Validation(
                    "A rejection reason is required when rejecting a claim".to_string(),
                ));
            }
            if reason.chars().count() > MAX_REJECTION_REASON_LEN {
                return Err(CoreError::Validation(format!(
                    "Rejection reason must be at most {MAX_REJECTION_REASON_LEN} characters"
                )));
            }
            Ok(ReviewDecision {
                status: ClaimStatus::Rejected,
                rejection_reason: Some(reason.to_string()),
            })
        }
    }
}

/// Validate the free-text justification attached to a claim.
pub fn validate_story(story: &str) -> Result<(), CoreError> {
    let trimmed = story.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Claim story must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_STORY_LEN {
        return Err(CoreError::Validation(format!(
            "Claim story must be at most {MAX_STORY_LEN} characters"
        )));
    }
    Ok(())
}

/// Check that `claimer_id` may open a claim on a found item.
///
/// A found item accepts claims while `available` or `pending_claim`, so
/// several claimants can compete until the finder approves one.
pub fn check_claimable(
    found_item_id: DbId,
    status: FoundItemStatus,
    finder_id: DbId,
    claimer_id: DbId,
) -> Result<(), CoreError> {
    if finder_id == claimer_id {
        return Err(CoreError::Forbidden(
            "You cannot claim an item you reported as found".to_string(),
        ));
    }
    match status {
        FoundItemStatus::Available | FoundItemStatus::PendingClaim => Ok(()),
        FoundItemStatus::Claimed | FoundItemStatus::Expired => Err(CoreError::Unavailable {
            entity: "FoundItem",
            id: found_item_id,
            status: status.as_str(),
        }),
    }
}

/// Check that `reviewer_id` is the finder and the claim is still reviewable.
pub fn check_reviewable(
    claim_status: ClaimStatus,
    finder_id: DbId,
    reviewer_id: DbId,
    target: ClaimStatus,
) -> Result<(), CoreError> {
    if finder_id != reviewer_id {
        return Err(CoreError::Forbidden(
            "Only the finder of this item can review its claims".to_string(),
        ));
    }
    claim_status.transition(target).map(|_| ())
}

/// Check that `claimer_id` owns a claim that can still be cancelled.
pub fn check_cancellable(
    claim_status: ClaimStatus,
    owner_id: DbId,
    claimer_id: DbId,
) -> Result<(), CoreError> {
    if owner_id != claimer_id {
        return Err(CoreError::Forbidden(
            "Only the claimant can cancel this claim".to_string(),
        ));
    }
    if claim_status != ClaimStatus::Pending {
        return Err(CoreError::InvalidTransition {
            entity: "Claim",
            from: claim_status.as_str(),
            to: "cancelled",
        });
    }
    Ok(())
}
