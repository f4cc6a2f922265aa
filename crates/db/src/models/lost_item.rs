//! Lost item report models.

use chrono::NaiveDate;
use lostfound_core::error::CoreError;
use lostfound_core::status::{decode_status, LostItemStatus, StatusId};
use lostfound_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `lost_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LostItem {
    pub id: DbId,
    pub owner_id: DbId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub last_seen_location: String,
    pub date_lost: NaiveDate,
    pub reward_cents: Option<i64>,
    pub image_urls: Vec<String>,
    pub status_id: StatusId,
    pub ai_processed: bool,
    pub last_matched_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl LostItem {
    pub fn status(&self) -> Result<LostItemStatus, CoreError> {
        decode_status(self.status_id)
    }
}

/// DTO for reporting a lost item.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLostItem {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(length(min = 1, max = 300))]
    pub last_seen_location: String,
    pub date_lost: NaiveDate,
    #[validate(range(min = 0))]
    pub reward_cents: Option<i64>,
    #[validate(length(max = 10))]
    #[serde(default)]
    pub image_urls: Vec<String>,
}
