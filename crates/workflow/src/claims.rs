//! Claim workflow: create, review, cancel.
//!
//! Each operation takes the found item's row lock first, so competing
//! reviews of one item serialise. Approval cascades to the competing
//! claims, the originating match, and the lost item in the same
//! transaction.

use std::sync::Arc;

use lostfound_core::claim::{
    check_cancellable, check_claimable, check_reviewable, validate_review, validate_story,
    SUPERSEDED_REJECTION_REASON,
};
use lostfound_core::error::CoreError;
use lostfound_core::status::{
    ClaimStatus, FoundItemStatus, LostItemStatus, MatchStatus, StatusTransitions,
};
use lostfound_core::types::DbId;
use lostfound_db::models::claim::{Claim, CreateClaim, NewClaim, ReviewClaimRequest};
use lostfound_db::models::found_item::FoundItem;
use lostfound_db::models::item_match::ItemMatch;
use lostfound_db::repositories::{ClaimRepo, FoundItemRepo, LostItemRepo, MatchRepo, UserRepo};
use lostfound_db::{is_unique_violation, DbPool};
use lostfound_events::{EventBus, PlatformEvent};
use sqlx::PgConnection;

use crate::error::{not_found, WorkflowError};
use crate::notify;

#[derive(Clone)]
pub struct ClaimWorkflow {
    pool: DbPool,
    events: Arc<EventBus>,
}

impl ClaimWorkflow {
    pub fn new(pool: DbPool, events: Arc<EventBus>) -> Self {
        Self { pool, events }
    }

    /// Open a claim on a found item.
    pub async fn create_claim(
        &self,
        found_item_id: DbId,
        claimer_id: DbId,
        input: &CreateClaim,
    ) -> Result<Claim, WorkflowError> {
        validate_story(&input.story)?;

        let mut tx = self.pool.begin().await?;

        let found = FoundItemRepo::find_for_update(&mut *tx, found_item_id)
            .await?
            .ok_or_else(|| not_found("FoundItem", found_item_id))?;
        let found_status = found.status()?;
        check_claimable(found.id, found_status, found.finder_id, claimer_id)?;

        if ClaimRepo::find_pending_by_claimer(&mut *tx, found.id, claimer_id)
            .await?
            .is_some()
        {
            return Err(duplicate_claim());
        }

        let origin = match input.match_id {
            Some(match_id) => Some(claimable_match(&mut tx, match_id, &found, claimer_id).await?),
            None => MatchRepo::best_pending_for_claimer(&mut *tx, found.id, claimer_id).await?,
        };
        if let Some(m) = &origin {
            lock_open_lost_item(&mut tx, m.lost_item_id).await?;
            MatchRepo::transition(&mut *tx, m.id, MatchStatus::Pending, MatchStatus::Claimed)
                .await?;
        }

        let claim = ClaimRepo::create(
            &mut *tx,
            &NewClaim {
                found_item_id: found.id,
                claimer_id,
                match_id: origin.as_ref().map(|m| m.id),
                story: input.story.trim().to_string(),
            },
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "uq_claims_pending_claimer") {
                duplicate_claim()
            } else {
                e.into()
            }
        })?;

        if found_status == FoundItemStatus::Available {
            found_status.transition(FoundItemStatus::PendingClaim)?;
            FoundItemRepo::update_status(&mut *tx, found.id, FoundItemStatus::PendingClaim).await?;
        }

        tx.commit().await?;

        tracing::info!(
            claim_id = claim.id,
            found_item_id = found.id,
            claimer_id,
            match_id = ?claim.match_id,
            "Claim created"
        );
        self.events.publish(notify::claim_received(&claim, &found));
        Ok(claim)
    }

    /// Approve or reject a pending claim. Only the finder may review.
    pub async fn review_claim(
        &self,
        claim_id: DbId,
        reviewer_id: DbId,
        request: &ReviewClaimRequest,
    ) -> Result<Claim, WorkflowError> {
        let decision = validate_review(request.action, request.rejection_reason.as_deref())?;

        let mut tx = self.pool.begin().await?;
        let (found, claim) = lock_claim(&mut tx, claim_id).await?;
        check_reviewable(claim.status()?, found.finder_id, reviewer_id, decision.status)?;

        let mut events = Vec::new();
        let reviewed = match decision.status {
            ClaimStatus::Approved => {
                let found_status = found.status()?;
                found_status.transition(FoundItemStatus::Claimed)?;

                let approved = ClaimRepo::set_reviewed(
                    &mut *tx,
                    claim.id,
                    ClaimStatus::Approved,
                    reviewer_id,
                    None,
                )
                .await?;
                FoundItemRepo::update_status(&mut *tx, found.id, FoundItemStatus::Claimed).await?;

                let superseded = ClaimRepo::reject_other_pending(
                    &mut *tx,
                    found.id,
                    claim.id,
                    reviewer_id,
                    SUPERSEDED_REJECTION_REASON,
                )
                .await?;
                let superseded_matches: Vec<DbId> =
                    superseded.iter().filter_map(|c| c.match_id).collect();
                if !superseded_matches.is_empty() {
                    MatchRepo::reject_open(&mut *tx, &superseded_matches).await?;
                }

                if let Some(match_id) = approved.match_id {
                    resolve_match(&mut tx, match_id).await?;
                }

                let finder = UserRepo::find_contact(&mut *tx, found.finder_id).await?;
                events.push(notify::claim_approved(&approved, &found, finder.as_ref()));
                events.extend(superseded.iter().map(|c| notify::claim_rejected(c, &found)));

                tracing::info!(
                    claim_id = approved.id,
                    found_item_id = found.id,
                    superseded = superseded.len(),
                    "Claim approved"
                );
                approved
            }
            ClaimStatus::Rejected => {
                let rejected = ClaimRepo::set_reviewed(
                    &mut *tx,
                    claim.id,
                    ClaimStatus::Rejected,
                    reviewer_id,
                    decision.rejection_reason.as_deref(),
                )
                .await?;
                release_claim(&mut tx, &found, rejected.match_id).await?;
                events.push(notify::claim_rejected(&rejected, &found));

                tracing::info!(claim_id = rejected.id, found_item_id = found.id, "Claim rejected");
                rejected
            }
            ClaimStatus::Pending => {
                return Err(CoreError::Internal("Review cannot target pending".to_string()).into())
            }
        };

        tx.commit().await?;
        self.publish_all(events);
        Ok(reviewed)
    }

    /// Withdraw a pending claim. The row is deleted.
    pub async fn cancel_claim(&self, claim_id: DbId, claimer_id: DbId) -> Result<(), WorkflowError> {
        let mut tx = self.pool.begin().await?;
        let (found, claim) = lock_claim(&mut tx, claim_id).await?;
        check_cancellable(claim.status()?, claim.claimer_id, claimer_id)?;

        ClaimRepo::delete(&mut *tx, claim.id).await?;
        release_claim(&mut tx, &found, claim.match_id).await?;

        tx.commit().await?;
        tracing::info!(claim_id, found_item_id = found.id, "Claim cancelled");
        Ok(())
    }

    /// A claim, visible to the claimant, the finder, and admins.
    pub async fn get(
        &self,
        claim_id: DbId,
        viewer_id: DbId,
        is_admin: bool,
    ) -> Result<Claim, WorkflowError> {
        let claim = ClaimRepo::find_by_id(&self.pool, claim_id)
            .await?
            .ok_or_else(|| not_found("Claim", claim_id))?;
        if is_admin || claim.claimer_id == viewer_id {
            return Ok(claim);
        }
        let found = FoundItemRepo::find_by_id(&self.pool, claim.found_item_id).await?;
        if found.is_some_and(|f| f.finder_id == viewer_id) {
            return Ok(claim);
        }
        Err(CoreError::Forbidden("You are not a party to this claim".to_string()).into())
    }

    /// Claims on a found item, for its finder.
    pub async fn list_for_found_item(
        &self,
        found_item_id: DbId,
        viewer_id: DbId,
        is_admin: bool,
    ) -> Result<Vec<Claim>, WorkflowError> {
        let found = FoundItemRepo::find_by_id(&self.pool, found_item_id)
            .await?
            .ok_or_else(|| not_found("FoundItem", found_item_id))?;
        if !is_admin && found.finder_id != viewer_id {
            return Err(CoreError::Forbidden(
                "Only the finder can list claims on this item".to_string(),
            )
            .into());
        }
        Ok(ClaimRepo::list_for_found_item(&self.pool, found.id).await?)
    }

    pub async fn list_mine(
        &self,
        claimer_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Claim>, WorkflowError> {
        Ok(ClaimRepo::list_by_claimer(&self.pool, claimer_id, limit, offset).await?)
    }

    fn publish_all(&self, events: Vec<PlatformEvent>) {
        for event in events {
            self.events.publish(event);
        }
    }
}

fn duplicate_claim() -> WorkflowError {
    CoreError::Conflict("You already have a pending claim on this item".to_string()).into()
}

/// Lock the claim's found item, then the claim itself.
async fn lock_claim(
    conn: &mut PgConnection,
    claim_id: DbId,
) -> Result<(FoundItem, Claim), WorkflowError> {
    let claim = ClaimRepo::find_by_id(&mut *conn, claim_id)
        .await?
        .ok_or_else(|| not_found("Claim", claim_id))?;
    let found = FoundItemRepo::find_for_update(&mut *conn, claim.found_item_id)
        .await?
        .ok_or_else(|| not_found("FoundItem", claim.found_item_id))?;
    // Re-read under the item lock; a concurrent review may have landed.
    let claim = ClaimRepo::find_for_update(&mut *conn, claim_id)
        .await?
        .ok_or_else(|| not_found("Claim", claim_id))?;
    Ok((found, claim))
}

/// Validate a claimant-supplied match and lock it.
async fn claimable_match(
    conn: &mut PgConnection,
    match_id: DbId,
    found: &FoundItem,
    claimer_id: DbId,
) -> Result<ItemMatch, WorkflowError> {
    let m = MatchRepo::find_for_update(&mut *conn, match_id)
        .await?
        .ok_or_else(|| not_found("Match", match_id))?;
    if m.found_item_id != found.id {
        return Err(CoreError::Validation(format!(
            "Match {match_id} does not refer to found item {}",
            found.id
        ))
        .into());
    }
    let lost = LostItemRepo::find_by_id(&mut *conn, m.lost_item_id)
        .await?
        .ok_or_else(|| not_found("LostItem", m.lost_item_id))?;
    if lost.owner_id != claimer_id {
        return Err(CoreError::Forbidden(
            "You can only claim through a match on your own lost item".to_string(),
        )
        .into());
    }
    m.status()?.transition(MatchStatus::Claimed)?;
    Ok(m)
}

/// Lock a claim's lost item. Taken after the match lock, so an expiry
/// sweep either sees the claimed match or has already expired the item.
async fn lock_open_lost_item(
    conn: &mut PgConnection,
    lost_item_id: DbId,
) -> Result<(), WorkflowError> {
    let lost = LostItemRepo::find_for_update(&mut *conn, lost_item_id)
        .await?
        .ok_or_else(|| not_found("LostItem", lost_item_id))?;
    match lost.status()? {
        LostItemStatus::Active | LostItemStatus::HasMatches => Ok(()),
        status => Err(CoreError::Unavailable {
            entity: "LostItem",
            id: lost.id,
            status: status.as_str(),
        }
        .into()),
    }
}

/// Approve the originating match and resolve its lost item.
async fn resolve_match(conn: &mut PgConnection, match_id: DbId) -> Result<(), WorkflowError> {
    let m = MatchRepo::find_for_update(&mut *conn, match_id)
        .await?
        .ok_or_else(|| not_found("Match", match_id))?;
    let status = m.status()?;
    status.transition(MatchStatus::Approved)?;
    MatchRepo::transition(&mut *conn, m.id, status, MatchStatus::Approved).await?;

    let lost = LostItemRepo::find_for_update(&mut *conn, m.lost_item_id)
        .await?
        .ok_or_else(|| not_found("LostItem", m.lost_item_id))?;
    let lost_status = lost.status()?;
    if lost_status.can_transition_to(LostItemStatus::Resolved) {
        LostItemRepo::update_status(&mut *conn, lost.id, LostItemStatus::Resolved).await?;
    } else {
        tracing::warn!(
            lost_item_id = lost.id,
            status = lost_status.as_str(),
            "Lost item not resolvable, leaving status unchanged"
        );
    }
    Ok(())
}

/// Undo a claim's hold: return its match to `pending` and, when no other
/// claim is waiting, the found item to `available`.
async fn release_claim(
    conn: &mut PgConnection,
    found: &FoundItem,
    match_id: Option<DbId>,
) -> Result<(), WorkflowError> {
    if let Some(match_id) = match_id {
        MatchRepo::transition(&mut *conn, match_id, MatchStatus::Claimed, MatchStatus::Pending)
            .await?;
    }
    let found_status = found.status()?;
    if found_status == FoundItemStatus::PendingClaim
        && ClaimRepo::count_pending(&mut *conn, found.id).await? == 0
    {
        found_status.transition(FoundItemStatus::Available)?;
        FoundItemRepo::update_status(&mut *conn, found.id, FoundItemStatus::Available).await?;
    }
    Ok(())
}
