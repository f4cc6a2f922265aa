//! Claim models: a user's assertion of ownership over a found item.

use lostfound_core::claim::ReviewAction;
use lostfound_core::error::CoreError;
use lostfound_core::status::{decode_status, ClaimStatus, StatusId};
use lostfound_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `claims` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Claim {
    pub id: DbId,
    pub found_item_id: DbId,
    pub claimer_id: DbId,
    pub match_id: Option<DbId>,
    pub story: String,
    pub status_id: StatusId,
    pub reviewed_at: Option<Timestamp>,
    pub reviewer_id: Option<DbId>,
    pub rejection_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Claim {
    pub fn status(&self) -> Result<ClaimStatus, CoreError> {
        decode_status(self.status_id)
    }
}

/// Request body for opening a claim on a found item.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateClaim {
    #[validate(length(min = 1, max = 2000))]
    pub story: String,
    /// The match this claim stems from. When absent, the claimant's best
    /// pending match for the item is linked automatically.
    pub match_id: Option<DbId>,
}

/// Insert DTO for a claim row.
#[derive(Debug, Clone)]
pub struct NewClaim {
    pub found_item_id: DbId,
    pub claimer_id: DbId,
    pub match_id: Option<DbId>,
    pub story: String,
}

/// Request body for the review endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewClaimRequest {
    pub action: ReviewAction,
    pub rejection_reason: Option<String>,
}
