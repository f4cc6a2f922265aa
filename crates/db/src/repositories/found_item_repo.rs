//! Repository for the `found_items` table.

use lostfound_core::status::{FoundItemStatus, StatusId};
use lostfound_core::types::{DbId, Timestamp};
use sqlx::PgExecutor;

use crate::models::found_item::{CreateFoundItem, FoundItem};

/// Column list for found_items queries.
const COLUMNS: &str = "id, finder_id, name, description, category, location_found, \
    found_at, image_urls, status_id, ai_processed, last_matched_at, created_at, updated_at";

/// Provides CRUD and lifecycle operations for found item reports.
pub struct FoundItemRepo;

impl FoundItemRepo {
    /// Insert a new found item in `available` status, returning the created row.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        finder_id: DbId,
        input: &CreateFoundItem,
    ) -> Result<FoundItem, sqlx::Error> {
        let query = format!(
            "INSERT INTO found_items
                (finder_id, name, description, category, location_found,
                 found_at, image_urls, status_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FoundItem>(&query)
            .bind(finder_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.category)
            .bind(&input.location_found)
            .bind(input.found_at)
            .bind(&input.image_urls)
            .bind(FoundItemStatus::Available.id())
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<FoundItem>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM found_items WHERE id = $1");
        sqlx::query_as::<_, FoundItem>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Fetch and row-lock a found item. Every claim transition on the item
    /// takes this lock first, which serialises competing reviews.
    pub async fn find_for_update<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<FoundItem>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM found_items WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, FoundItem>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// List a finder's reports, newest first.
    pub async fn list_by_finder<'e, E: PgExecutor<'e>>(
        executor: E,
        finder_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FoundItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM found_items
             WHERE finder_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, FoundItem>(&query)
            .bind(finder_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(executor)
            .await
    }

    /// Browse found items in one status, newest first.
    pub async fn list_by_status<'e, E: PgExecutor<'e>>(
        executor: E,
        status: FoundItemStatus,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FoundItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM found_items
             WHERE status_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, FoundItem>(&query)
            .bind(status.id())
            .bind(limit)
            .bind(offset)
            .fetch_all(executor)
            .await
    }

    /// Set the status of a found item. Returns `false` if the row is missing.
    pub async fn update_status<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        status: FoundItemStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE found_items SET status_id = $2 WHERE id = $1")
            .bind(id)
            .bind(status.id())
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record that the similarity service has indexed and matched these items.
    pub async fn mark_processed<'e, E: PgExecutor<'e>>(
        executor: E,
        ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE found_items SET ai_processed = true, last_matched_at = NOW()
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
    ) -> Result<Vec<FoundItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM found_items
             WHERE ai_processed = false AND status_id = ANY($1)
             ORDER BY created_at ASC, id ASC
             LIMIT $2"
        );
        sqlx::query_as::<_, FoundItem>(&query)
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
            "SELECT id FROM found_items
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
    vec![
        FoundItemStatus::Available.id(),
        FoundItemStatus::PendingClaim.id(),
    ]
}
