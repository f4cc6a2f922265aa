//! The similarity service seam and its retrying instant-match wrapper.

use async_trait::async_trait;
use lostfound_core::retry::{retry_with_backoff_if, RetryPolicy};

use crate::error::SimilarityError;
use crate::types::{BackgroundMatch, InstantMatch, ItemFeatures};

/// Remote similarity scoring.
#[async_trait]
pub trait SimilarityService: Send + Sync {
    /// Index one item and return its best counterparts on the other side.
    async fn match_instant(
        &self,
        features: &ItemFeatures,
    ) -> Result<Vec<InstantMatch>, SimilarityError>;

    /// Score up to `limit` unprocessed items, returning pairs at or above
    /// `threshold`.
    async fn match_background(
        &self,
        limit: i64,
        threshold: f64,
    ) -> Result<Vec<BackgroundMatch>, SimilarityError>;

    /// Whether the service is reachable and its models are loaded.
    async fn health(&self) -> bool;
}

/// Call [`SimilarityService::match_instant`] under `policy`.
///
/// Only transport failures and 5xx/429 answers are retried; see
/// [`SimilarityError::is_retryable`].
pub async fn match_instant_with_retry(
    service: &dyn SimilarityService,
    features: &ItemFeatures,
    policy: &RetryPolicy,
) -> Result<Vec<InstantMatch>, SimilarityError> {
    retry_with_backoff_if(
        "similarity.match_instant",
        policy,
        SimilarityError::is_retryable,
        || service.match_instant(features),
    )
    .await
}
