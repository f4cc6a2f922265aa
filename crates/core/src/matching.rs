//! Match reconciliation policy.
//!
//! Pure decisions behind the match orchestrator: how a candidate pair is
//! validated, whether it creates, upgrades, or leaves an existing match,
//! when a `match_found` notification is due, and how background batches
//! are shaped before submission.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::MatchStatus;
use crate::types::DbId;

/// Default similarity at or above which both parties are notified.
pub const DEFAULT_HIGH_CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Default minimum similarity requested from the background pass.
pub const DEFAULT_BACKGROUND_THRESHOLD: f64 = 0.75;

/// Similarity at or above which a match is labelled `medium`.
pub const MEDIUM_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Default number of items processed per background batch.
pub const DEFAULT_BATCH_LIMIT: i64 = 100;

/// Default number of candidates kept per lost item in one batch.
pub const DEFAULT_MAX_MATCHES_PER_LOST_ITEM: usize = 5;

// ---------------------------------------------------------------------------
// Provenance
// ---------------------------------------------------------------------------

/// Which signal produced the similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Image,
    Text,
    Hybrid,
    Manual,
}

impl MatchType {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchType::Image => "image",
            MatchType::Text => "text",
            MatchType::Hybrid => "hybrid",
            MatchType::Manual => "manual",
        }
    }

    /// Parse a stored or remote label. The similarity service also reports
    /// cross-modal labels, which fold into `hybrid`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "image" => Some(MatchType::Image),
            "text" | "text_clip" | "text_sentence" => Some(MatchType::Text),
            "hybrid" | "image_to_text" | "text_to_image" => Some(MatchType::Hybrid),
            "manual" => Some(MatchType::Manual),
            _ => None,
        }
    }
}

/// Which path submitted a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    /// Request-triggered matching right after an item is reported.
    Instant,
    /// The periodic reconciliation pass.
    Background,
    /// An operator override.
    Manual,
}

impl MatchSource {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchSource::Instant => "instant",
            MatchSource::Background => "background",
            MatchSource::Manual => "manual",
        }
    }

    /// Manual overrides are exempt from the monotonic-similarity rule.
    pub fn is_automated(self) -> bool {
        !matches!(self, MatchSource::Manual)
    }
}

/// Coarse confidence label shown alongside a similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchConfidence {
    High,
    Medium,
    Low,
}

impl MatchConfidence {
    pub fn classify(similarity: f64) -> Self {
        if similarity >= DEFAULT_HIGH_CONFIDENCE_THRESHOLD {
            MatchConfidence::High
        } else if similarity >= MEDIUM_CONFIDENCE_THRESHOLD {
            MatchConfidence::Medium
        } else {
            MatchConfidence::Low
        }
    }
}

// ---------------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------------

/// A candidate correspondence reported by the similarity service or an operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub lost_item_id: DbId,
    pub found_item_id: DbId,
    pub similarity: f64,
    pub match_type: MatchType,
    pub source: MatchSource,
}

/// Validate that a similarity score is a finite value in `[0, 1]`.
pub fn validate_similarity(similarity: f64) -> Result<(), CoreError> {
    if similarity.is_finite() && (0.0..=1.0).contains(&similarity) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Similarity must be within [0, 1], got {similarity}"
        )))
    }
}

/// The part of a persisted match the reconciliation decision depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExistingMatch {
    pub similarity: f64,
    pub match_type: MatchType,
    pub status: MatchStatus,
}

/// What the orchestrator should do with a candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchDecision {
    /// No match exists for the pair yet.
    Create,
    /// Overwrite similarity and match type in place. Status is never touched.
    Upgrade { similarity: f64, match_type: MatchType },
    /// Leave the existing row alone.
    Unchanged,
}

/// Decide how a candidate reconciles with the existing match for its pair.
///
/// Automated sources only ever raise similarity (`max(existing, new)`), and
/// the match type follows the score only when it strictly increases. Manual
/// sources set the score exactly. Neither path changes match status, so an
/// `approved` or `claimed` match never regresses to `pending`.
pub fn reconcile(existing: Option<&ExistingMatch>, candidate: &MatchCandidate) -> MatchDecision {
    let Some(existing) = existing else {
        return MatchDecision::Create;
    };

    if candidate.source.is_automated() {
        if candidate.similarity > existing.similarity {
            MatchDecision::Upgrade {
                similarity: candidate.similarity,
                match_type: candidate.match_type,
            }
        } else {
            MatchDecision::Unchanged
        }
    } else if candidate.similarity != existing.similarity
        || candidate.match_type != existing.match_type
    {
        MatchDecision::Upgrade {
            similarity: candidate.similarity,
            match_type: candidate.match_type,
        }
    } else {
        MatchDecision::Unchanged
    }
}

/// Whether a `match_found` notification is due for a match.
///
/// Each match notifies at most once: when it first sits at or above the
/// threshold while still open for claiming.
pub fn should_notify(
    similarity: f64,
    status: MatchStatus,
    notification_sent: bool,
    threshold: f64,
) -> bool {
    !notification_sent && similarity >= threshold && status == MatchStatus::Pending
}

/// Filter and trim a background batch.
///
/// Drops candidates below `threshold`, collapses duplicate pairs to the
/// highest score, and keeps at most `max_per_lost_item` best candidates per
/// lost item. Output is ordered by lost item, then descending similarity.
pub fn shape_batch(
    candidates: Vec<MatchCandidate>,
    threshold: f64,
    max_per_lost_item: usize,
) -> Vec<MatchCandidate> {
    let mut best: HashMap<(DbId, DbId), MatchCandidate> = HashMap::new();
    for candidate in candidates {
        if candidate.similarity.is_nan() || candidate.similarity < threshold {
            continue;
        }
        let key = (candidate.lost_item_id, candidate.found_item_id);
        match best.get(&key) {
            Some(current) if current.similarity >= candidate.similarity => {}
            _ => {
                best.insert(key, candidate);
            }
        }
    }

    let mut by_lost: HashMap<DbId, Vec<MatchCandidate>> = HashMap::new();
    for candidate in best.into_values() {
        by_lost
            .entry(candidate.lost_item_id)
            .or_default()
            .push(candidate);
    }

    let mut lost_ids: Vec<DbId> = by_lost.keys().copied().collect();
    lost_ids.sort_unstable();

    let mut shaped = Vec::new();
    for lost_id in lost_ids {
        let Some(mut group) = by_lost.remove(&lost_id) else {
            continue;
        };
        group.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then(a.found_item_id.cmp(&b.found_item_id))
        });
        group.truncate(max_per_lost_item);
        shaped.extend(group);
    }
    shaped
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunables for match reconciliation.
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// Similarity at or above which both parties are notified.
    pub high_confidence_threshold: f64,
    /// Minimum similarity requested from / accepted by the background pass.
    pub background_threshold: f64,
    /// Upper bound on items handled per background batch.
    pub batch_limit: i64,
    /// Candidates kept per lost item per batch.
    pub max_matches_per_lost_item: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            high_confidence_threshold: DEFAULT_HIGH_CONFIDENCE_THRESHOLD,
            background_threshold: DEFAULT_BACKGROUND_THRESHOLD,
            batch_limit: DEFAULT_BATCH_LIMIT,
            max_matches_per_lost_item: DEFAULT_MAX_MATCHES_PER_LOST_ITEM,
        }
    }
}

impl MatchingConfig {
    /// Reject thresholds outside `[0, 1]` and empty batches.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_similarity(self.high_confidence_threshold)?;
        validate_similarity(self.background_threshold)?;
        if self.batch_limit < 1 {
            return Err(CoreError::Validation(
                "Batch limit must be at least 1".to_string(),
            ));
        }
        if self.max_matches_per_lost_item == 0 {
            return Err(CoreError::Validation(
                "Max matches per lost item must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
