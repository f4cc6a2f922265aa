//! Repository for the `claims` table.

use lostfound_core::status::ClaimStatus;
use lostfound_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::claim::{Claim, NewClaim};

/// Column list for claims queries.
const COLUMNS: &str = "id, found_item_id, claimer_id, match_id, story, status_id, \
    reviewed_at, reviewer_id, rejection_reason, created_at, updated_at";

/// Provides persistence for ownership claims.
pub struct ClaimRepo;

impl ClaimRepo {
    /// Insert a `pending` claim. Fails with a unique violation on
    /// `uq_claims_pending_claimer` if the claimant already has one open.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &NewClaim,
    ) -> Result<Claim, sqlx::Error> {
        let query = format!(
            "INSERT INTO claims (found_item_id, claimer_id, match_id, story, status_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Claim>(&query)
            .bind(input.found_item_id)
            .bind(input.claimer_id)
            .bind(input.match_id)
            .bind(&input.story)
            .bind(ClaimStatus::Pending.id())
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<Claim>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM claims WHERE id = $1");
        sqlx::query_as::<_, Claim>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_for_update<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<Claim>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM claims WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Claim>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// The claimant's open claim on a found item, if any.
    pub async fn find_pending_by_claimer<'e, E: PgExecutor<'e>>(
        executor: E,
        found_item_id: DbId,
        claimer_id: DbId,
    ) -> Result<Option<Claim>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM claims
             WHERE found_item_id = $1 AND claimer_id = $2 AND status_id = $3"
        );
        sqlx::query_as::<_, Claim>(&query)
            .bind(found_item_id)
            .bind(claimer_id)
            .bind(ClaimStatus::Pending.id())
            .fetch_optional(executor)
            .await
    }

    /// All claims on a found item, oldest first.
    pub async fn list_for_found_item<'e, E: PgExecutor<'e>>(
        executor: E,
        found_item_id: DbId,
    ) -> Result<Vec<Claim>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM claims
             WHERE found_item_id = $1
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Claim>(&query)
            .bind(found_item_id)
            .fetch_all(executor)
            .await
    }

    /// A claimant's claims, newest first.
    pub async fn list_by_claimer<'e, E: PgExecutor<'e>>(
        executor: E,
        claimer_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Claim>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM claims
             WHERE claimer_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Claim>(&query)
            .bind(claimer_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(executor)
            .await
    }

    /// Record a review decision on a claim.
    pub async fn set_reviewed<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        status: ClaimStatus,
        reviewer_id: DbId,
        rejection_reason: Option<&str>,
    ) -> Result<Claim, sqlx::Error> {
        let query = format!(
            "UPDATE claims
             SET status_id = $2, reviewer_id = $3, rejection_reason = $4, reviewed_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Claim>(&query)
            .bind(id)
            .bind(status.id())
            .bind(reviewer_id)
            .bind(rejection_reason)
            .fetch_one(executor)
            .await
    }

    /// Reject every other pending claim on a found item, returning them.
    pub async fn reject_other_pending<'e, E: PgExecutor<'e>>(
        executor: E,
        found_item_id: DbId,
        except_claim_id: DbId,
        reviewer_id: DbId,
        reason: &str,
    ) -> Result<Vec<Claim>, sqlx::Error> {
        let query = format!(
            "UPDATE claims
             SET status_id = $4, reviewer_id = $5, rejection_reason = $6, reviewed_at = NOW()
             WHERE found_item_id = $1 AND id <> $2 AND status_id = $3
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Claim>(&query)
            .bind(found_item_id)
            .bind(except_claim_id)
            .bind(ClaimStatus::Pending.id())
            .bind(ClaimStatus::Rejected.id())
            .bind(reviewer_id)
            .bind(reason)
            .fetch_all(executor)
            .await
    }

    /// Delete a claim. Returns `true` if a row was removed.
    pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM claims WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of pending claims on a found item.
    pub async fn count_pending<'e, E: PgExecutor<'e>>(
        executor: E,
        found_item_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM claims WHERE found_item_id = $1 AND status_id = $2",
        )
        .bind(found_item_id)
        .bind(ClaimStatus::Pending.id())
        .fetch_one(executor)
        .await
    }
}
