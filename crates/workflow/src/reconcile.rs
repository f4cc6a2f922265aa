//! Periodic reconciliation passes: background matching, expiry, and the
//! similarity service health check.
//!
//! The passes are plain async methods; scheduling lives with the server.

use std::sync::Arc;

use chrono::Utc;
use lostfound_core::expiry::{ExpiryPolicy, EXPIRABLE_FOUND_STATUSES, EXPIRABLE_LOST_STATUSES};
use lostfound_core::matching::{shape_batch, MatchCandidate};
use lostfound_core::status::{FoundItemStatus, LostItemStatus, StatusTransitions};
use lostfound_core::types::{DbId, Timestamp};
use lostfound_db::repositories::{ClaimRepo, FoundItemRepo, LostItemRepo, MatchRepo};
use lostfound_db::DbPool;
use lostfound_similarity::SimilarityService;
use serde::Serialize;

use crate::error::WorkflowError;
use crate::orchestrator::{BatchSummary, MatchOrchestrator};

#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchingPassSummary {
    pub lost_items_selected: usize,
    pub found_items_selected: usize,
    pub candidates_received: usize,
    pub candidates_submitted: usize,
    pub batch: BatchSummary,
    /// The similarity service failed; selected items wait for the next pass.
    pub deferred: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExpirySummary {
    pub lost_items_expired: Vec<DbId>,
    pub found_items_expired: Vec<DbId>,
    pub matches_expired: u64,
}

#[derive(Clone)]
pub struct Reconciler {
    pool: DbPool,
    similarity: Arc<dyn SimilarityService>,
    orchestrator: MatchOrchestrator,
    expiry: ExpiryPolicy,
}

impl Reconciler {
    pub fn new(
        pool: DbPool,
        similarity: Arc<dyn SimilarityService>,
        orchestrator: MatchOrchestrator,
        expiry: ExpiryPolicy,
    ) -> Self {
        Self {
            pool,
            similarity,
            orchestrator,
            expiry,
        }
    }

    /// Match a bounded batch of unprocessed items.
    ///
    /// No retry: if the similarity service fails, the items keep
    /// `ai_processed = false` and the next pass picks them up.
    pub async fn run_matching_pass(&self) -> Result<MatchingPassSummary, WorkflowError> {
        let config = self.orchestrator.config();
        let lost = LostItemRepo::list_unprocessed(&self.pool, config.batch_limit).await?;
        let found = FoundItemRepo::list_unprocessed(&self.pool, config.batch_limit).await?;

        let mut summary = MatchingPassSummary {
            lost_items_selected: lost.len(),
            found_items_selected: found.len(),
            ..Default::default()
        };
        if lost.is_empty() && found.is_empty() {
            tracing::debug!("No unprocessed items, skipping matching pass");
            return Ok(summary);
        }

        let results = match self
            .similarity
            .match_background(config.batch_limit, config.background_threshold)
            .await
        {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(error = %e, "Background matching deferred");
                summary.deferred = true;
                return Ok(summary);
            }
        };
        summary.candidates_received = results.len();

        // The service picks its own slice of active lost items and scores
        // each against every found item, so only lost items that show up in
        // its results are known to have been scored.
        let mut scored_lost: Vec<DbId> = results.iter().map(|r| r.lost_item_id).collect();
        scored_lost.sort_unstable();
        scored_lost.dedup();

        let candidates: Vec<MatchCandidate> = results.into_iter().map(Into::into).collect();
        let shaped = shape_batch(
            candidates,
            config.background_threshold,
            config.max_matches_per_lost_item,
        );
        summary.candidates_submitted = shaped.len();
        summary.batch = self.orchestrator.submit_batch(&shaped).await;

        // Unscored lost items stay unprocessed and are offered again.
        LostItemRepo::mark_processed(&self.pool, &scored_lost).await?;
        let found_ids: Vec<DbId> = found.iter().map(|i| i.id).collect();
        FoundItemRepo::mark_processed(&self.pool, &found_ids).await?;

        tracing::info!(
            lost = summary.lost_items_selected,
            found = summary.found_items_selected,
            received = summary.candidates_received,
            submitted = summary.candidates_submitted,
            created = summary.batch.created,
            "Matching pass complete"
        );
        Ok(summary)
    }

    /// Expire stale reports and the pending matches that reference them.
    pub async fn run_expiry_pass(&self) -> Result<ExpirySummary, WorkflowError> {
        self.run_expiry_pass_at(Utc::now()).await
    }

    /// [`run_expiry_pass`](Self::run_expiry_pass) against a fixed clock.
    ///
    /// Candidates are read without locks, then each item is expired in its
    /// own transaction after re-checking it under its row lock. A claim that
    /// commits while the sweep waits on that lock is seen by the re-check.
    pub async fn run_expiry_pass_at(&self, now: Timestamp) -> Result<ExpirySummary, WorkflowError> {
        let mut summary = ExpirySummary::default();

        let lost_cutoff = self.expiry.lost_cutoff(now);
        for id in LostItemRepo::list_stale_ids(&self.pool, lost_cutoff).await? {
            if self.expire_lost_item(id, lost_cutoff).await? {
                summary.lost_items_expired.push(id);
            }
        }

        let found_cutoff = self.expiry.found_cutoff(now);
        for id in FoundItemRepo::list_stale_ids(&self.pool, found_cutoff).await? {
            if self.expire_found_item(id, found_cutoff).await? {
                summary.found_items_expired.push(id);
            }
        }

        summary.matches_expired = MatchRepo::expire_pending_for_expired_items(&self.pool).await?;

        tracing::info!(
            lost = summary.lost_items_expired.len(),
            found = summary.found_items_expired.len(),
            matches = summary.matches_expired,
            "Expiry pass complete"
        );
        Ok(summary)
    }

    /// Expire one lost item unless it has left the open states or a match
    /// on it is being claimed.
    async fn expire_lost_item(&self, id: DbId, cutoff: Timestamp) -> Result<bool, WorkflowError> {
        let mut tx = self.pool.begin().await?;
        let Some(item) = LostItemRepo::find_for_update(&mut *tx, id).await? else {
            return Ok(false);
        };
        let status = item.status()?;
        if !EXPIRABLE_LOST_STATUSES.contains(&status) || item.created_at >= cutoff {
            return Ok(false);
        }
        if MatchRepo::count_claimed_for_lost_item(&mut *tx, id).await? > 0 {
            tracing::debug!(lost_item_id = id, "Claim in flight, expiry postponed");
            return Ok(false);
        }
        status.transition(LostItemStatus::Expired)?;
        LostItemRepo::update_status(&mut *tx, id, LostItemStatus::Expired).await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Expire one found item unless it has left the open states or a claim
    /// on it awaits review.
    async fn expire_found_item(&self, id: DbId, cutoff: Timestamp) -> Result<bool, WorkflowError> {
        let mut tx = self.pool.begin().await?;
        let Some(item) = FoundItemRepo::find_for_update(&mut *tx, id).await? else {
            return Ok(false);
        };
        let status = item.status()?;
        if !EXPIRABLE_FOUND_STATUSES.contains(&status) || item.created_at >= cutoff {
            return Ok(false);
        }
        if ClaimRepo::count_pending(&mut *tx, id).await? > 0 {
            tracing::debug!(found_item_id = id, "Claim in flight, expiry postponed");
            return Ok(false);
        }
        status.transition(FoundItemStatus::Expired)?;
        FoundItemRepo::update_status(&mut *tx, id, FoundItemStatus::Expired).await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Ask the similarity service whether it is healthy. Failures are logged only.
    pub async fn check_health(&self) -> bool {
        let healthy = self.similarity.health().await;
        if healthy {
            tracing::debug!("Similarity service healthy");
        } else {
            tracing::warn!("Similarity service health check failed");
        }
        healthy
    }
}
