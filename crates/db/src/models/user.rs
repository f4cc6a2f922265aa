//! User models. Users are provisioned by the external auth system.

use lostfound_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub display_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Contact details shared with an approved claimant.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserContact {
    pub id: DbId,
    pub display_name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// DTO for provisioning a user record.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub display_name: String,
    pub email: String,
    pub phone: Option<String>,
}
