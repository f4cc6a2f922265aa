//! Integration tests for the claim lifecycle and its cascades.

mod common;

use assert_matches::assert_matches;
use common::{candidate, found_item, harness, lost_item, user, Harness};
use lostfound_core::claim::{ReviewAction, SUPERSEDED_REJECTION_REASON};
use lostfound_core::error::CoreError;
use lostfound_core::matching::MatchType;
use lostfound_core::status::{ClaimStatus, FoundItemStatus, LostItemStatus, MatchStatus};
use lostfound_core::types::DbId;
use lostfound_db::models::claim::{Claim, CreateClaim, ReviewClaimRequest};
use lostfound_db::repositories::{ClaimRepo, FoundItemRepo, LostItemRepo, MatchRepo};
use lostfound_workflow::WorkflowError;
use sqlx::PgPool;

fn story(text: &str) -> CreateClaim {
    CreateClaim {
        story: text.to_string(),
        match_id: None,
    }
}

fn approve() -> ReviewClaimRequest {
    ReviewClaimRequest {
        action: ReviewAction::Approve,
        rejection_reason: None,
    }
}

fn reject(reason: &str) -> ReviewClaimRequest {
    ReviewClaimRequest {
        action: ReviewAction::Reject,
        rejection_reason: Some(reason.to_string()),
    }
}

async fn claim_on(h: &Harness, found_item_id: DbId, claimer: DbId) -> Claim {
    h.claims
        .create_claim(found_item_id, claimer, &story("It has my student card inside"))
        .await
        .unwrap()
}

async fn found_status(pool: &PgPool, id: DbId) -> FoundItemStatus {
    FoundItemRepo::find_by_id(pool, id)
        .await
        .unwrap()
        .unwrap()
        .status()
        .unwrap()
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_create_claim_holds_item_and_notifies_finder(pool: PgPool) {
    let mut h = harness(pool.clone());
    let finder = user(&pool, "Finder").await;
    let claimer = user(&pool, "Claimer").await;
    let found = found_item(&pool, finder, "Blue Wallet").await;

    let claim = claim_on(&h, found.id, claimer).await;
    assert_eq!(claim.status().unwrap(), ClaimStatus::Pending);
    assert!(claim.match_id.is_none());
    assert_eq!(found_status(&pool, found.id).await, FoundItemStatus::PendingClaim);

    let events = h.drain_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "claim_received");
    assert_eq!(events[0].recipients, vec![finder]);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_claim_links_best_pending_match(pool: PgPool) {
    let h = harness(pool.clone());
    let finder = user(&pool, "Finder").await;
    let owner = user(&pool, "Owner").await;
    let found = found_item(&pool, finder, "Blue Wallet").await;
    let weak = lost_item(&pool, owner, "Wallet").await;
    let strong = lost_item(&pool, owner, "Blue Wallet").await;

    h.orchestrator
        .submit_batch(&[
            candidate(weak.id, found.id, 0.62, MatchType::Text),
            candidate(strong.id, found.id, 0.88, MatchType::Hybrid),
        ])
        .await;

    let claim = claim_on(&h, found.id, owner).await;
    let linked = MatchRepo::find_by_id(&pool, claim.match_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(linked.lost_item_id, strong.id);
    assert_eq!(linked.status().unwrap(), MatchStatus::Claimed);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_create_claim_preconditions(pool: PgPool) {
    let h = harness(pool.clone());
    let finder = user(&pool, "Finder").await;
    let claimer = user(&pool, "Claimer").await;
    let found = found_item(&pool, finder, "Umbrella").await;

    let own = h.claims.create_claim(found.id, finder, &story("Mine")).await;
    assert_matches!(own, Err(WorkflowError::Core(CoreError::Forbidden(_))));

    let missing = h.claims.create_claim(123_456, claimer, &story("Mine")).await;
    assert_matches!(
        missing,
        Err(WorkflowError::Core(CoreError::NotFound { entity: "FoundItem", .. }))
    );

    let blank = h.claims.create_claim(found.id, claimer, &story("   ")).await;
    assert_matches!(blank, Err(WorkflowError::Core(CoreError::Validation(_))));

    claim_on(&h, found.id, claimer).await;
    let duplicate = h.claims.create_claim(found.id, claimer, &story("Again")).await;
    assert_matches!(duplicate, Err(WorkflowError::Core(CoreError::Conflict(_))));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_claim_through_someone_elses_match_is_forbidden(pool: PgPool) {
    let h = harness(pool.clone());
    let finder = user(&pool, "Finder").await;
    let owner = user(&pool, "Owner").await;
    let stranger = user(&pool, "Stranger").await;
    let found = found_item(&pool, finder, "Ring").await;
    let lost = lost_item(&pool, owner, "Ring").await;

    let m = h
        .orchestrator
        .submit(&candidate(lost.id, found.id, 0.9, MatchType::Image))
        .await
        .unwrap();
    let result = h
        .claims
        .create_claim(
            found.id,
            stranger,
            &CreateClaim {
                story: "That is my ring".to_string(),
                match_id: Some(m.item_match().unwrap().id),
            },
        )
        .await;
    assert_matches!(result, Err(WorkflowError::Core(CoreError::Forbidden(_))));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_approval_is_exclusive(pool: PgPool) {
    let mut h = harness(pool.clone());
    let finder = user(&pool, "Finder").await;
    let a = user(&pool, "Alice").await;
    let b = user(&pool, "Bob").await;
    let c = user(&pool, "Carol").await;
    let found = found_item(&pool, finder, "Backpack").await;
    let lost_b = lost_item(&pool, b, "Backpack").await;
    h.orchestrator
        .submit(&candidate(lost_b.id, found.id, 0.7, MatchType::Text))
        .await
        .unwrap();

    let c1 = claim_on(&h, found.id, a).await;
    let c2 = claim_on(&h, found.id, b).await;
    assert!(c2.match_id.is_some());
    h.drain_events();

    let approved = h.claims.review_claim(c1.id, finder, &approve()).await.unwrap();
    assert_eq!(approved.status().unwrap(), ClaimStatus::Approved);
    assert_eq!(approved.reviewer_id, Some(finder));
    assert!(approved.reviewed_at.is_some());
    assert_eq!(found_status(&pool, found.id).await, FoundItemStatus::Claimed);

    let c2 = ClaimRepo::find_by_id(&pool, c2.id).await.unwrap().unwrap();
    assert_eq!(c2.status().unwrap(), ClaimStatus::Rejected);
    assert_eq!(c2.rejection_reason.as_deref(), Some(SUPERSEDED_REJECTION_REASON));
    let b_match = MatchRepo::find_by_id(&pool, c2.match_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(b_match.status().unwrap(), MatchStatus::Rejected);

    let events = h.drain_events();
    let approved_event = events
        .iter()
        .find(|e| e.event_type == "claim_approved")
        .unwrap();
    assert_eq!(approved_event.recipients, vec![a]);
    assert_eq!(
        approved_event.payload["finder_contact"]["email"],
        "finder@example.com"
    );
    let rejected_event = events
        .iter()
        .find(|e| e.event_type == "claim_rejected")
        .unwrap();
    assert_eq!(rejected_event.recipients, vec![b]);

    let third = h.claims.create_claim(found.id, c, &story("Mine actually")).await;
    assert_matches!(
        third,
        Err(WorkflowError::Core(CoreError::Unavailable { status: "claimed", .. }))
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_rejecting_only_claim_reverts_item(pool: PgPool) {
    let mut h = harness(pool.clone());
    let finder = user(&pool, "Finder").await;
    let owner = user(&pool, "Owner").await;
    let found = found_item(&pool, finder, "Glasses").await;
    let lost = lost_item(&pool, owner, "Glasses").await;
    h.orchestrator
        .submit(&candidate(lost.id, found.id, 0.75, MatchType::Image))
        .await
        .unwrap();
    let claim = claim_on(&h, found.id, owner).await;
    h.drain_events();

    let missing_reason = h
        .claims
        .review_claim(
            claim.id,
            finder,
            &ReviewClaimRequest {
                action: ReviewAction::Reject,
                rejection_reason: None,
            },
        )
        .await;
    assert_matches!(missing_reason, Err(WorkflowError::Core(CoreError::Validation(_))));

    let rejected = h
        .claims
        .review_claim(claim.id, finder, &reject("Frame colour does not match"))
        .await
        .unwrap();
    assert_eq!(rejected.status().unwrap(), ClaimStatus::Rejected);
    assert_eq!(
        rejected.rejection_reason.as_deref(),
        Some("Frame colour does not match")
    );
    assert_eq!(found_status(&pool, found.id).await, FoundItemStatus::Available);

    let m = MatchRepo::find_by_id(&pool, claim.match_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(m.status().unwrap(), MatchStatus::Pending);

    let events = h.drain_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "claim_rejected");
    assert_eq!(events[0].payload["rejection_reason"], "Frame colour does not match");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_rejecting_one_of_two_claims_keeps_hold(pool: PgPool) {
    let h = harness(pool.clone());
    let finder = user(&pool, "Finder").await;
    let a = user(&pool, "Alice").await;
    let b = user(&pool, "Bob").await;
    let found = found_item(&pool, finder, "Calculator").await;

    let c1 = claim_on(&h, found.id, a).await;
    claim_on(&h, found.id, b).await;

    h.claims
        .review_claim(c1.id, finder, &reject("Wrong model"))
        .await
        .unwrap();
    assert_eq!(found_status(&pool, found.id).await, FoundItemStatus::PendingClaim);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_only_finder_reviews_and_only_once(pool: PgPool) {
    let h = harness(pool.clone());
    let finder = user(&pool, "Finder").await;
    let claimer = user(&pool, "Claimer").await;
    let found = found_item(&pool, finder, "Helmet").await;
    let claim = claim_on(&h, found.id, claimer).await;

    let by_claimer = h.claims.review_claim(claim.id, claimer, &approve()).await;
    assert_matches!(by_claimer, Err(WorkflowError::Core(CoreError::Forbidden(_))));

    h.claims
        .review_claim(claim.id, finder, &reject("No proof"))
        .await
        .unwrap();
    let again = h.claims.review_claim(claim.id, finder, &approve()).await;
    assert_matches!(
        again,
        Err(WorkflowError::Core(CoreError::InvalidTransition { entity: "Claim", .. }))
    );

    let missing = h.claims.review_claim(987_654, finder, &approve()).await;
    assert_matches!(
        missing,
        Err(WorkflowError::Core(CoreError::NotFound { entity: "Claim", .. }))
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_cancel_claim(pool: PgPool) {
    let h = harness(pool.clone());
    let finder = user(&pool, "Finder").await;
    let owner = user(&pool, "Owner").await;
    let other = user(&pool, "Other").await;
    let found = found_item(&pool, finder, "Notebook").await;
    let lost = lost_item(&pool, owner, "Notebook").await;
    h.orchestrator
        .submit(&candidate(lost.id, found.id, 0.7, MatchType::Text))
        .await
        .unwrap();
    let claim = claim_on(&h, found.id, owner).await;

    let by_other = h.claims.cancel_claim(claim.id, other).await;
    assert_matches!(by_other, Err(WorkflowError::Core(CoreError::Forbidden(_))));

    h.claims.cancel_claim(claim.id, owner).await.unwrap();
    assert!(ClaimRepo::find_by_id(&pool, claim.id).await.unwrap().is_none());
    assert_eq!(found_status(&pool, found.id).await, FoundItemStatus::Available);
    let m = MatchRepo::find_by_id(&pool, claim.match_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(m.status().unwrap(), MatchStatus::Pending);

    // A fresh claim can be opened after cancelling.
    let again = claim_on(&h, found.id, owner).await;
    h.claims.review_claim(again.id, finder, &approve()).await.unwrap();
    let cancel_approved = h.claims.cancel_claim(again.id, owner).await;
    assert_matches!(
        cancel_approved,
        Err(WorkflowError::Core(CoreError::InvalidTransition { to: "cancelled", .. }))
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_approval_resolves_originating_match(pool: PgPool) {
    let h = harness(pool.clone());
    let finder = user(&pool, "Finder").await;
    let owner = user(&pool, "Owner").await;
    let found = found_item(&pool, finder, "Camera").await;
    let lost = lost_item(&pool, owner, "Camera").await;
    let m = h
        .orchestrator
        .submit(&candidate(lost.id, found.id, 0.83, MatchType::Image))
        .await
        .unwrap();
    let match_id = m.item_match().unwrap().id;

    let claim = h
        .claims
        .create_claim(
            found.id,
            owner,
            &CreateClaim {
                story: "Serial number ends in 4471".to_string(),
                match_id: Some(match_id),
            },
        )
        .await
        .unwrap();
    assert_eq!(claim.match_id, Some(match_id));

    h.claims.review_claim(claim.id, finder, &approve()).await.unwrap();

    let m = MatchRepo::find_by_id(&pool, match_id).await.unwrap().unwrap();
    assert_eq!(m.status().unwrap(), MatchStatus::Approved);
    let lost = LostItemRepo::find_by_id(&pool, lost.id).await.unwrap().unwrap();
    assert_eq!(lost.status().unwrap(), LostItemStatus::Resolved);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_claim_visibility(pool: PgPool) {
    let h = harness(pool.clone());
    let finder = user(&pool, "Finder").await;
    let claimer = user(&pool, "Claimer").await;
    let stranger = user(&pool, "Stranger").await;
    let found = found_item(&pool, finder, "Charger").await;
    let claim = claim_on(&h, found.id, claimer).await;

    assert!(h.claims.get(claim.id, claimer, false).await.is_ok());
    assert!(h.claims.get(claim.id, finder, false).await.is_ok());
    assert!(h.claims.get(claim.id, stranger, true).await.is_ok());
    assert_matches!(
        h.claims.get(claim.id, stranger, false).await,
        Err(WorkflowError::Core(CoreError::Forbidden(_)))
    );

    assert_eq!(
        h.claims
            .list_for_found_item(found.id, finder, false)
            .await
            .unwrap()
            .len(),
        1
    );
    assert_matches!(
        h.claims.list_for_found_item(found.id, claimer, false).await,
        Err(WorkflowError::Core(CoreError::Forbidden(_)))
    );
    assert_eq!(h.claims.list_mine(claimer, 50, 0).await.unwrap().len(), 1);
}
