//! Repository for the `lost_items` table.

use lostfound_core::status::{LostItemStatus, StatusId};
use lostfound_core::types::{DbId, Timestamp};
use sqlx::PgExecutor;

use crate::models::lost_item::{CreateLostItem, LostItem};

/// Column list for lost_items queries.
const COLUMNS: &str = "id, owner_id, name, description, category, last_seen_location, \
    date_lost, reward_cents, image_urls, status_id, ai_processed, last_matched_at, \
    created_at, updated_at";

/// Provides CRUD and lifecycle operations for lost item reports.
pub struct LostItemRepo;

impl LostItemRepo {
    /// Insert a new lost item in `active` status, returning the created row.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        owner_id: DbId,
        input: &CreateLostItem,
    ) -> Result<LostItem, sqlx::Error> {
        let query = format!(
            "INSERT INTO lost_items
                (owner_id, name, description, category, last_seen_location,
                 date_lost, reward_cents, image_urls, status_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LostItem>(&query)
            .bind(owner_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.category)
            .bind(&input.last_seen_location)
            .bind(input.date_lost)
            .bind(input.reward_cents)
            .bind(&input.image_urls)
            .bind(LostItemStatus::Active.id())
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<LostItem>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM lost_items WHERE id = $1");
        sqlx::query_as::<_, LostItem>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Fetch and row-lock a lost item for the rest of the transaction.
    pub async fn find_for_update<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<LostItem>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM lost_items WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, LostItem>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// List an owner's reports, newest first.
    pub async fn list_by_owner<'e, E: PgExecutor<'e>>(
        executor: E,
        owner_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LostItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM lost_items
             WHERE owner_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, LostItem>(&query)
            .bind(owner_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(executor)
            .await
    }

    /// Set the status of a lost item. Returns `false` if the row is missing.
    pub async fn update_status<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        status: LostItemStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE lost_items SET status_id = $2 WHERE id = $1")
            .bind(id)
            .bind(status.id())
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Move an `active` item to `has_matches`. No-op in any other status.
    pub async fn mark_has_matches<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE lost_items SET status_id = $2 WHERE id = $1 AND status_id = $3")
                .bind(id)
                .bind(LostItemStatus::HasMatches.id())
                .bind(LostItemStatus::Active.id())
                .execute(executor)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Stamp `last_matched_at` without touching `ai_processed`.
    pub async fn stamp_matched<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE lost_items SET last_matched_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Record that the similarity service has indexed and matched these items.
    pub async fn mark_processed<'e, E: PgExecutor<'e>>(
        executor: E,
        ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE lost_items SET ai_processed = true, last_matched_at = NOW()
             WHERE id = ANY($1)",
        )
        .bind(ids)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Oldest open items the similarity service has not yet processed.
    pub async fn list_unprocessed<'e, E: PgExecutor<'e>>(
        executor: E,
        limit: i64,
    ) -> Result<Vec<LostItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM lost_items
             WHERE ai_processed = false AND status_id = ANY($1)
             ORDER BY created_at ASC, id ASC
             LIMIT $2"
        );
        sqlx::query_as::<_, LostItem>(&query)
            .bind(open_statuses())
            .bind(limit)
            .fetch_all(executor)
            .await
    }

    /// IDs of open items created before `cutoff`, oldest first.
    ///
    /// A plain read: callers lock and re-check each item before expiring it.
    pub async fn list_stale_ids<'e, E: PgExecutor<'e>>(
        executor: E,
        cutoff: Timestamp,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT id FROM lost_items
             WHERE status_id = ANY($1) AND created_at < $2
             ORDER BY created_at ASC, id ASC",
        )
        .bind(open_statuses())
        .bind(cutoff)
        .fetch_all(executor)
        .await
    }
}

fn open_statuses() -> Vec<StatusId> {
    vec![LostItemStatus::Active.id(), LostItemStatus::HasMatches.id()]
}
