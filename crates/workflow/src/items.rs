//! Item reporting and instant matching.

use std::sync::Arc;

use lostfound_core::error::CoreError;
use lostfound_core::retry::RetryPolicy;
use lostfound_core::status::FoundItemStatus;
use lostfound_core::types::DbId;
use lostfound_db::models::found_item::{CreateFoundItem, FoundItem};
use lostfound_db::models::item_match::ItemMatch;
use lostfound_db::models::lost_item::{CreateLostItem, LostItem};
use lostfound_db::repositories::{FoundItemRepo, LostItemRepo, MatchRepo};
use lostfound_db::DbPool;
use lostfound_similarity::{match_instant_with_retry, ItemFeatures, ItemKind, SimilarityService};
use serde::Serialize;
use validator::Validate;

use crate::error::{not_found, WorkflowError};
use crate::orchestrator::{MatchOrchestrator, MatchOutcome};

/// Whether instant matching ran for a freshly reported item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchingState {
    Completed,
    /// The similarity service was unavailable; the background pass will
    /// pick the item up.
    Pending,
}

/// A saved report plus the instant-matching result.
#[derive(Debug, Clone, Serialize)]
pub struct ReportedItem<T> {
    pub item: T,
    pub matching: MatchingState,
    pub matches_found: usize,
}

#[derive(Clone)]
pub struct ItemService {
    pool: DbPool,
    similarity: Arc<dyn SimilarityService>,
    orchestrator: MatchOrchestrator,
    retry: RetryPolicy,
}

impl ItemService {
    pub fn new(
        pool: DbPool,
        similarity: Arc<dyn SimilarityService>,
        orchestrator: MatchOrchestrator,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            pool,
            similarity,
            orchestrator,
            retry,
        }
    }

    /// Save a lost item report, then try instant matching.
    ///
    /// The report is committed before the similarity call, so it survives
    /// any matching failure.
    pub async fn report_lost(
        &self,
        owner_id: DbId,
        input: &CreateLostItem,
    ) -> Result<ReportedItem<LostItem>, WorkflowError> {
        input.validate()?;
        let item = LostItemRepo::create(&self.pool, owner_id, input).await?;
        tracing::info!(lost_item_id = item.id, owner_id, "Lost item reported");

        let features = ItemFeatures {
            item_id: item.id,
            kind: ItemKind::Lost,
            name: item.name.clone(),
            description: item.description.clone(),
            category: item.category.clone(),
            image_url: item.image_urls.first().cloned(),
        };
        let (matching, matches_found) = self.match_instant(&features).await?;

        // Matching may have moved the item to `has_matches`.
        let item = LostItemRepo::find_by_id(&self.pool, item.id)
            .await?
            .ok_or_else(|| not_found("LostItem", item.id))?;
        Ok(ReportedItem {
            item,
            matching,
            matches_found,
        })
    }

    /// Save a found item report, then try instant matching.
    pub async fn report_found(
        &self,
        finder_id: DbId,
        input: &CreateFoundItem,
    ) -> Result<ReportedItem<FoundItem>, WorkflowError> {
        input.validate()?;
        let item = FoundItemRepo::create(&self.pool, finder_id, input).await?;
        tracing::info!(found_item_id = item.id, finder_id, "Found item reported");

        let features = ItemFeatures {
            item_id: item.id,
            kind: ItemKind::Found,
            name: item.name.clone(),
            description: item.description.clone(),
            category: item.category.clone(),
            image_url: item.image_urls.first().cloned(),
        };
        let (matching, matches_found) = self.match_instant(&features).await?;

        let item = FoundItemRepo::find_by_id(&self.pool, item.id)
            .await?
            .ok_or_else(|| not_found("FoundItem", item.id))?;
        Ok(ReportedItem {
            item,
            matching,
            matches_found,
        })
    }

    /// Call the similarity service with retry and submit its results.
    ///
    /// Marks the item processed only when the service answered. Returns the
    /// matching state and how many matches were created or updated.
    pub async fn match_instant(
        &self,
        features: &ItemFeatures,
    ) -> Result<(MatchingState, usize), WorkflowError> {
        let hits =
            match match_instant_with_retry(self.similarity.as_ref(), features, &self.retry).await {
                Ok(hits) => hits,
                Err(e) => {
                    tracing::warn!(
                        item_id = features.item_id,
                        kind = ?features.kind,
                        error = %e,
                        "Instant matching unavailable, deferring to background pass"
                    );
                    return Ok((MatchingState::Pending, 0));
                }
            };

        let mut matched = 0;
        for hit in hits {
            let candidate = hit.into_candidate(features.item_id, features.kind);
            match self.orchestrator.submit(&candidate).await {
                Ok(MatchOutcome::Created(_) | MatchOutcome::Upgraded(_)) => matched += 1,
                Ok(_) => {}
                Err(e) => tracing::warn!(
                    lost_item_id = candidate.lost_item_id,
                    found_item_id = candidate.found_item_id,
                    error = %e,
                    "Instant match candidate failed"
                ),
            }
        }

        match features.kind {
            ItemKind::Lost => LostItemRepo::mark_processed(&self.pool, &[features.item_id]).await?,
            ItemKind::Found => {
                FoundItemRepo::mark_processed(&self.pool, &[features.item_id]).await?
            }
        };
        Ok((MatchingState::Completed, matched))
    }

    pub async fn get_lost(&self, id: DbId) -> Result<LostItem, WorkflowError> {
        LostItemRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| not_found("LostItem", id))
    }

    pub async fn get_found(&self, id: DbId) -> Result<FoundItem, WorkflowError> {
        FoundItemRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| not_found("FoundItem", id))
    }

    pub async fn list_lost_by_owner(
        &self,
        owner_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LostItem>, WorkflowError> {
        Ok(LostItemRepo::list_by_owner(&self.pool, owner_id, limit, offset).await?)
    }

    pub async fn list_found_by_finder(
        &self,
        finder_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FoundItem>, WorkflowError> {
        Ok(FoundItemRepo::list_by_finder(&self.pool, finder_id, limit, offset).await?)
    }

    pub async fn list_found_by_status(
        &self,
        status: FoundItemStatus,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FoundItem>, WorkflowError> {
        Ok(FoundItemRepo::list_by_status(&self.pool, status, limit, offset).await?)
    }

    /// Matches for a lost item, for its owner.
    pub async fn matches_for_lost(
        &self,
        id: DbId,
        viewer_id: DbId,
        is_admin: bool,
    ) -> Result<Vec<ItemMatch>, WorkflowError> {
        let item = self.get_lost(id).await?;
        if !is_admin && item.owner_id != viewer_id {
            return Err(CoreError::Forbidden(
                "Only the owner can see matches for this item".to_string(),
            )
            .into());
        }
        Ok(MatchRepo::list_for_lost_item(&self.pool, id).await?)
    }

    /// Matches for a found item, for its finder.
    pub async fn matches_for_found(
        &self,
        id: DbId,
        viewer_id: DbId,
        is_admin: bool,
    ) -> Result<Vec<ItemMatch>, WorkflowError> {
        let item = self.get_found(id).await?;
        if !is_admin && item.finder_id != viewer_id {
            return Err(CoreError::Forbidden(
                "Only the finder can see matches for this item".to_string(),
            )
            .into());
        }
        Ok(MatchRepo::list_for_found_item(&self.pool, id).await?)
    }
}
