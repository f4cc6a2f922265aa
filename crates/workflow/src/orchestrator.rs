//! Match orchestrator: candidate pairs in, deduplicated matches out.
//!
//! Every path that records a match (instant matching, background passes,
//! batch ingest, operator overrides) funnels through [`MatchOrchestrator::submit`].
//! The pair lookup under `FOR UPDATE` is the dedup key; `uq_matches_pair`
//! breaks ties when two writers insert the same pair concurrently, and the
//! loser retries once as an update.

use std::sync::Arc;

use lostfound_core::error::CoreError;
use lostfound_core::matching::{
    reconcile, should_notify, validate_similarity, MatchCandidate, MatchDecision, MatchSource,
    MatchType, MatchingConfig,
};
use lostfound_core::status::{FoundItemStatus, LostItemStatus};
use lostfound_core::types::DbId;
use lostfound_db::models::item_match::{CreateManualMatch, ItemMatch, MatchStats, NewMatch};
use lostfound_db::repositories::{FoundItemRepo, LostItemRepo, MatchRepo};
use lostfound_db::{is_unique_violation, DbPool};
use lostfound_events::{EventBus, PlatformEvent};
use serde::Serialize;

use crate::error::{not_found, WorkflowError};
use crate::notify;

/// Why a candidate was dropped without touching the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingLostItem,
    MissingFoundItem,
    /// The lost item's owner reported the found item too.
    SameOwner,
    /// One side is resolved, claimed or expired.
    ItemClosed,
}

/// Result of submitting one candidate.
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    Created(ItemMatch),
    Upgraded(ItemMatch),
    Unchanged(ItemMatch),
    Skipped(SkipReason),
}

impl MatchOutcome {
    pub fn item_match(&self) -> Option<&ItemMatch> {
        match self {
            MatchOutcome::Created(m) | MatchOutcome::Upgraded(m) | MatchOutcome::Unchanged(m) => {
                Some(m)
            }
            MatchOutcome::Skipped(_) => None,
        }
    }
}

/// Counts from a batch submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &Result<MatchOutcome, WorkflowError>) {
        match outcome {
            Ok(MatchOutcome::Created(_)) => self.created += 1,
            Ok(MatchOutcome::Upgraded(_)) => self.updated += 1,
            Ok(MatchOutcome::Unchanged(_)) => self.unchanged += 1,
            Ok(MatchOutcome::Skipped(_)) => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }
}

#[derive(Clone)]
pub struct MatchOrchestrator {
    pool: DbPool,
    events: Arc<EventBus>,
    config: MatchingConfig,
}

impl MatchOrchestrator {
    pub fn new(pool: DbPool, events: Arc<EventBus>, config: MatchingConfig) -> Self {
        Self {
            pool,
            events,
            config,
        }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Reconcile one candidate with the stored match for its pair.
    pub async fn submit(&self, candidate: &MatchCandidate) -> Result<MatchOutcome, WorkflowError> {
        validate_similarity(candidate.similarity)?;

        let (outcome, event) = match self.submit_in_tx(candidate).await {
            Err(WorkflowError::Database(e)) if is_unique_violation(&e, "uq_matches_pair") => {
                tracing::debug!(
                    lost_item_id = candidate.lost_item_id,
                    found_item_id = candidate.found_item_id,
                    "Lost match insert race, retrying as update"
                );
                self.submit_in_tx(candidate).await?
            }
            other => other?,
        };

        if let Some(event) = event {
            self.events.publish(event);
        }
        Ok(outcome)
    }

    /// Submit many candidates, continuing past individual failures.
    pub async fn submit_batch(&self, candidates: &[MatchCandidate]) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for candidate in candidates {
            let outcome = self.submit(candidate).await;
            if let Err(e) = &outcome {
                tracing::warn!(
                    lost_item_id = candidate.lost_item_id,
                    found_item_id = candidate.found_item_id,
                    error = %e,
                    "Match candidate failed"
                );
            }
            summary.record(&outcome);
        }
        tracing::info!(
            created = summary.created,
            updated = summary.updated,
            unchanged = summary.unchanged,
            skipped = summary.skipped,
            failed = summary.failed,
            "Match batch processed"
        );
        summary
    }

    /// Operator override: set the pair's similarity exactly.
    ///
    /// Unlike automated submissions, missing or closed items are reported
    /// back as errors.
    pub async fn create_manual(&self, input: &CreateManualMatch) -> Result<ItemMatch, WorkflowError> {
        let candidate = MatchCandidate {
            lost_item_id: input.lost_item_id,
            found_item_id: input.found_item_id,
            similarity: input.similarity,
            match_type: input.match_type.unwrap_or(MatchType::Manual),
            source: MatchSource::Manual,
        };
        match self.submit(&candidate).await? {
            MatchOutcome::Skipped(SkipReason::MissingLostItem) => {
                Err(not_found("LostItem", input.lost_item_id))
            }
            MatchOutcome::Skipped(SkipReason::MissingFoundItem) => {
                Err(not_found("FoundItem", input.found_item_id))
            }
            MatchOutcome::Skipped(SkipReason::SameOwner) => Err(CoreError::Validation(
                "Lost and found items belong to the same user".to_string(),
            )
            .into()),
            MatchOutcome::Skipped(SkipReason::ItemClosed) => Err(CoreError::Conflict(
                "One of the items is no longer open for matching".to_string(),
            )
            .into()),
            MatchOutcome::Created(m) | MatchOutcome::Upgraded(m) | MatchOutcome::Unchanged(m) => {
                Ok(m)
            }
        }
    }

    /// A match, visible to the lost item's owner, the finder, and admins.
    pub async fn get(
        &self,
        id: DbId,
        viewer_id: DbId,
        is_admin: bool,
    ) -> Result<ItemMatch, WorkflowError> {
        let m = MatchRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| not_found("Match", id))?;
        if is_admin {
            return Ok(m);
        }
        let lost = LostItemRepo::find_by_id(&self.pool, m.lost_item_id).await?;
        let found = FoundItemRepo::find_by_id(&self.pool, m.found_item_id).await?;
        let is_party = lost.is_some_and(|l| l.owner_id == viewer_id)
            || found.is_some_and(|f| f.finder_id == viewer_id);
        if !is_party {
            return Err(CoreError::Forbidden("You are not a party to this match".to_string()).into());
        }
        Ok(m)
    }

    pub async fn stats(&self) -> Result<MatchStats, WorkflowError> {
        Ok(MatchRepo::stats(&self.pool, self.config.high_confidence_threshold).await?)
    }

    /// One attempt inside a transaction. Returns the outcome plus the
    /// notification to publish once the transaction has committed.
    async fn submit_in_tx(
        &self,
        candidate: &MatchCandidate,
    ) -> Result<(MatchOutcome, Option<PlatformEvent>), WorkflowError> {
        let mut tx = self.pool.begin().await?;

        // Lock order across workflows: found item, then match, then lost item.
        let Some(found) = FoundItemRepo::find_for_update(&mut *tx, candidate.found_item_id).await?
        else {
            return Ok((MatchOutcome::Skipped(SkipReason::MissingFoundItem), None));
        };
        let Some(lost) = LostItemRepo::find_by_id(&mut *tx, candidate.lost_item_id).await? else {
            return Ok((MatchOutcome::Skipped(SkipReason::MissingLostItem), None));
        };

        if lost.owner_id == found.finder_id {
            return Ok((MatchOutcome::Skipped(SkipReason::SameOwner), None));
        }
        let lost_open = matches!(
            lost.status()?,
            LostItemStatus::Active | LostItemStatus::HasMatches
        );
        let found_open = matches!(
            found.status()?,
            FoundItemStatus::Available | FoundItemStatus::PendingClaim
        );
        if !lost_open || !found_open {
            return Ok((MatchOutcome::Skipped(SkipReason::ItemClosed), None));
        }

        let existing =
            MatchRepo::find_by_pair_for_update(&mut *tx, lost.id, found.id).await?;
        let existing_view = existing.as_ref().map(ItemMatch::as_existing).transpose()?;

        let outcome = match (reconcile(existing_view.as_ref(), candidate), existing) {
            (MatchDecision::Create, _) => {
                let created = MatchRepo::insert(
                    &mut *tx,
                    &NewMatch {
                        lost_item_id: lost.id,
                        found_item_id: found.id,
                        similarity: candidate.similarity,
                        match_type: candidate.match_type,
                        source: candidate.source,
                    },
                )
                .await?;
                LostItemRepo::mark_has_matches(&mut *tx, lost.id).await?;
                LostItemRepo::stamp_matched(&mut *tx, lost.id).await?;
                FoundItemRepo::mark_processed(&mut *tx, &[found.id]).await?;
                tracing::info!(
                    match_id = created.id,
                    lost_item_id = lost.id,
                    found_item_id = found.id,
                    similarity = created.similarity,
                    source = candidate.source.as_str(),
                    "Match created"
                );
                MatchOutcome::Created(created)
            }
            (MatchDecision::Upgrade { similarity, match_type }, Some(current)) => {
                let updated = MatchRepo::update_score(&mut *tx, current.id, similarity, match_type)
                    .await?;
                tracing::info!(
                    match_id = updated.id,
                    from = current.similarity,
                    to = updated.similarity,
                    "Match similarity updated"
                );
                MatchOutcome::Upgraded(updated)
            }
            (MatchDecision::Unchanged, Some(current)) => MatchOutcome::Unchanged(current),
            (_, None) => {
                return Err(CoreError::Internal(
                    "Match decision requires an existing match".to_string(),
                )
                .into())
            }
        };

        let mut outcome = outcome;
        let mut event = None;
        if let MatchOutcome::Created(m) | MatchOutcome::Upgraded(m) | MatchOutcome::Unchanged(m) =
            &mut outcome
        {
            if should_notify(
                m.similarity,
                m.status()?,
                m.notification_sent,
                self.config.high_confidence_threshold,
            ) {
                MatchRepo::mark_notification_sent(&mut *tx, m.id).await?;
                m.notification_sent = true;
                event = Some(notify::match_found(m, &lost, &found));
            }
        }

        tx.commit().await?;
        Ok((outcome, event))
    }
}
