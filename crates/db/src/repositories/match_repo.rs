//! Repository for the `matches` table.

use lostfound_core::matching::{MatchType, MEDIUM_CONFIDENCE_THRESHOLD};
use lostfound_core::status::{FoundItemStatus, LostItemStatus, MatchStatus, StatusId};
use lostfound_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::item_match::{ItemMatch, MatchStats, MatchTypeCount, NewMatch};

/// Column list for matches queries.
const COLUMNS: &str = "id, lost_item_id, found_item_id, similarity, match_type, source, \
    status_id, detected_at, notification_sent, created_at, updated_at";

/// Column list qualified with the `m` alias, for joins.
const M_COLUMNS: &str = "m.id, m.lost_item_id, m.found_item_id, m.similarity, m.match_type, \
    m.source, m.status_id, m.detected_at, m.notification_sent, m.created_at, m.updated_at";

/// Provides persistence for lost/found correspondences.
pub struct MatchRepo;

impl MatchRepo {
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<ItemMatch>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM matches WHERE id = $1");
        sqlx::query_as::<_, ItemMatch>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_for_update<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<ItemMatch>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM matches WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, ItemMatch>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Fetch and row-lock the match for a pair, if one exists.
    pub async fn find_by_pair_for_update<'e, E: PgExecutor<'e>>(
        executor: E,
        lost_item_id: DbId,
        found_item_id: DbId,
    ) -> Result<Option<ItemMatch>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM matches
             WHERE lost_item_id = $1 AND found_item_id = $2
             FOR UPDATE"
        );
        sqlx::query_as::<_, ItemMatch>(&query)
            .bind(lost_item_id)
            .bind(found_item_id)
            .fetch_optional(executor)
            .await
    }

    /// Insert a `pending` match. Fails with a unique violation on
    /// `uq_matches_pair` if another writer created the pair first.
    pub async fn insert<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &NewMatch,
    ) -> Result<ItemMatch, sqlx::Error> {
        let query = format!(
            "INSERT INTO matches
                (lost_item_id, found_item_id, similarity, match_type, source, status_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ItemMatch>(&query)
            .bind(input.lost_item_id)
            .bind(input.found_item_id)
            .bind(input.similarity)
            .bind(input.match_type.as_str())
            .bind(input.source.as_str())
            .bind(MatchStatus::Pending.id())
            .fetch_one(executor)
            .await
    }

    /// Overwrite the score and type of a match. Status is untouched.
    pub async fn update_score<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        similarity: f64,
        match_type: MatchType,
    ) -> Result<ItemMatch, sqlx::Error> {
        let query = format!(
            "UPDATE matches SET similarity = $2, match_type = $3, detected_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ItemMatch>(&query)
            .bind(id)
            .bind(similarity)
            .bind(match_type.as_str())
            .fetch_one(executor)
            .await
    }

    pub async fn mark_notification_sent<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE matches SET notification_sent = true WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Move a match from `from` to `to`. Returns `false` when the match is
    /// not currently in `from`.
    pub async fn transition<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        from: MatchStatus,
        to: MatchStatus,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE matches SET status_id = $3 WHERE id = $1 AND status_id = $2")
                .bind(id)
                .bind(from.id())
                .bind(to.id())
                .execute(executor)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Reject every open (`pending` or `claimed`) match among `ids`.
    pub async fn reject_open<'e, E: PgExecutor<'e>>(
        executor: E,
        ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        let open: Vec<StatusId> = vec![MatchStatus::Pending.id(), MatchStatus::Claimed.id()];
        let result = sqlx::query(
            "UPDATE matches SET status_id = $1 WHERE id = ANY($2) AND status_id = ANY($3)",
        )
        .bind(MatchStatus::Rejected.id())
        .bind(ids)
        .bind(open)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Number of `claimed` matches on a lost item.
    pub async fn count_claimed_for_lost_item<'e, E: PgExecutor<'e>>(
        executor: E,
        lost_item_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM matches WHERE lost_item_id = $1 AND status_id = $2",
        )
        .bind(lost_item_id)
        .bind(MatchStatus::Claimed.id())
        .fetch_one(executor)
        .await
    }

    /// Expire `pending` matches whose lost or found item has expired.
    ///
    /// Runs after the item sweeps as its own statement, so a sweep
    /// interrupted between the two steps is repaired on the next run.
    pub async fn expire_pending_for_expired_items<'e, E: PgExecutor<'e>>(
        executor: E,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE matches m SET status_id = $1
             WHERE m.status_id = $2
               AND (
                   EXISTS (SELECT 1 FROM lost_items li
                           WHERE li.id = m.lost_item_id AND li.status_id = $3)
                   OR EXISTS (SELECT 1 FROM found_items fi
                              WHERE fi.id = m.found_item_id AND fi.status_id = $4)
               )",
        )
        .bind(MatchStatus::Expired.id())
        .bind(MatchStatus::Pending.id())
        .bind(LostItemStatus::Expired.id())
        .bind(FoundItemStatus::Expired.id())
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Matches for a lost item, best first.
    pub async fn list_for_lost_item<'e, E: PgExecutor<'e>>(
        executor: E,
        lost_item_id: DbId,
    ) -> Result<Vec<ItemMatch>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM matches
             WHERE lost_item_id = $1
             ORDER BY similarity DESC, id ASC"
        );
        sqlx::query_as::<_, ItemMatch>(&query)
            .bind(lost_item_id)
            .fetch_all(executor)
            .await
    }

    /// Matches for a found item, best first.
    pub async fn list_for_found_item<'e, E: PgExecutor<'e>>(
        executor: E,
        found_item_id: DbId,
    ) -> Result<Vec<ItemMatch>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM matches
             WHERE found_item_id = $1
             ORDER BY similarity DESC, id ASC"
        );
        sqlx::query_as::<_, ItemMatch>(&query)
            .bind(found_item_id)
            .fetch_all(executor)
            .await
    }

    /// The highest-scoring `pending` match between a found item and any open
    /// lost item owned by `claimer_id`, row-locked.
    pub async fn best_pending_for_claimer<'e, E: PgExecutor<'e>>(
        executor: E,
        found_item_id: DbId,
        claimer_id: DbId,
    ) -> Result<Option<ItemMatch>, sqlx::Error> {
        let query = format!(
            "SELECT {M_COLUMNS} FROM matches m
             JOIN lost_items li ON li.id = m.lost_item_id
             WHERE m.found_item_id = $1
               AND li.owner_id = $2
               AND m.status_id = $3
               AND li.status_id = ANY($4)
             ORDER BY m.similarity DESC, m.id ASC
             LIMIT 1
             FOR UPDATE OF m"
        );
        let open_lost: Vec<StatusId> =
            vec![LostItemStatus::Active.id(), LostItemStatus::HasMatches.id()];
        sqlx::query_as::<_, ItemMatch>(&query)
            .bind(found_item_id)
            .bind(claimer_id)
            .bind(MatchStatus::Pending.id())
            .bind(open_lost)
            .fetch_optional(executor)
            .await
    }

    /// Aggregate statistics across all matches.
    ///
    /// Takes the pool directly since it issues two queries.
    pub async fn stats(pool: &sqlx::PgPool, high_threshold: f64) -> Result<MatchStats, sqlx::Error> {
        let (total, average_similarity, high, medium, low): (i64, f64, i64, i64, i64) =
            sqlx::query_as(
                "SELECT
                    COUNT(*),
                    COALESCE(AVG(similarity), 0)::DOUBLE PRECISION,
                    COUNT(*) FILTER (WHERE similarity >= $1),
                    COUNT(*) FILTER (WHERE similarity >= $2 AND similarity < $1),
                    COUNT(*) FILTER (WHERE similarity < $2)
                 FROM matches",
            )
            .bind(high_threshold)
            .bind(MEDIUM_CONFIDENCE_THRESHOLD)
            .fetch_one(pool)
            .await?;

        let by_type = sqlx::query_as::<_, MatchTypeCount>(
            "SELECT match_type, COUNT(*) AS count FROM matches
             GROUP BY match_type
             ORDER BY count DESC, match_type ASC",
        )
        .fetch_all(pool)
        .await?;

        Ok(MatchStats {
            total,
            average_similarity,
            high_confidence: high,
            medium_confidence: medium,
            low_confidence: low,
            by_type,
        })
    }
}
