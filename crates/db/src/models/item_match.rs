//! Match models: the persisted correspondence between a lost and a found item.

use lostfound_core::error::CoreError;
use lostfound_core::matching::{ExistingMatch, MatchConfidence, MatchSource, MatchType};
use lostfound_core::status::{decode_status, MatchStatus, StatusId};
use lostfound_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `matches` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ItemMatch {
    pub id: DbId,
    pub lost_item_id: DbId,
    pub found_item_id: DbId,
    pub similarity: f64,
    pub match_type: String,
    pub source: String,
    pub status_id: StatusId,
    pub detected_at: Timestamp,
    pub notification_sent: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ItemMatch {
    pub fn status(&self) -> Result<MatchStatus, CoreError> {
        decode_status(self.status_id)
    }

    pub fn kind(&self) -> Result<MatchType, CoreError> {
        MatchType::parse(&self.match_type).ok_or_else(|| {
            CoreError::Internal(format!("Unknown match type '{}'", self.match_type))
        })
    }

    pub fn confidence(&self) -> MatchConfidence {
        MatchConfidence::classify(self.similarity)
    }

    /// The view the reconciliation policy decides on.
    pub fn as_existing(&self) -> Result<ExistingMatch, CoreError> {
        Ok(ExistingMatch {
            similarity: self.similarity,
            match_type: self.kind()?,
            status: self.status()?,
        })
    }
}

/// Insert DTO for a brand-new match row.
#[derive(Debug, Clone)]
pub struct NewMatch {
    pub lost_item_id: DbId,
    pub found_item_id: DbId,
    pub similarity: f64,
    pub match_type: MatchType,
    pub source: MatchSource,
}

/// Request body for an operator-created match.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateManualMatch {
    pub lost_item_id: DbId,
    pub found_item_id: DbId,
    pub similarity: f64,
    pub match_type: Option<MatchType>,
}

/// One AI-reported pair in a batch ingest request.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestCandidate {
    pub lost_item_id: DbId,
    pub found_item_id: DbId,
    pub similarity: f64,
    pub match_type: MatchType,
}

/// Request body for a batch ingest of AI results.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestBatch {
    pub candidates: Vec<IngestCandidate>,
}

/// Count of matches for one match type.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MatchTypeCount {
    pub match_type: String,
    pub count: i64,
}

/// Aggregate statistics over all matches.
#[derive(Debug, Clone, Serialize)]
pub struct MatchStats {
    pub total: i64,
    pub average_similarity: f64,
    pub high_confidence: i64,
    pub medium_confidence: i64,
    pub low_confidence: i64,
    pub by_type: Vec<MatchTypeCount>,
}
