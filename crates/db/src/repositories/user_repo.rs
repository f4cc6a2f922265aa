//! Repository for the `users` table.

use lostfound_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::user::{CreateUser, User, UserContact};

/// Column list for users queries.
const COLUMNS: &str = "id, display_name, email, phone, created_at, updated_at";

/// Provides read access to users plus provisioning for tests and tooling.
pub struct UserRepo;

impl UserRepo {
    /// Insert a user, returning the created row.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &CreateUser,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (display_name, email, phone)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.display_name)
            .bind(&input.email)
            .bind(&input.phone)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Contact details for a user, shared with the other party once a claim
    /// is approved.
    pub async fn find_contact<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<UserContact>, sqlx::Error> {
        sqlx::query_as::<_, UserContact>(
            "SELECT id, display_name, email, phone FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }
}
