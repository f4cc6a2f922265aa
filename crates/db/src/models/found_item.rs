//! Found item report models.

use lostfound_core::error::CoreError;
use lostfound_core::status::{decode_status, FoundItemStatus, StatusId};
use lostfound_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `found_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FoundItem {
    pub id: DbId,
    pub finder_id: DbId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub location_found: String,
    pub found_at: Timestamp,
    pub image_urls: Vec<String>,
    pub status_id: StatusId,
    pub ai_processed: bool,
    pub last_matched_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl FoundItem {
    pub fn status(&self) -> Result<FoundItemStatus, CoreError> {
        decode_status(self.status_id)
    }
}

/// DTO for reporting a found item. At least one proof image is required.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFoundItem {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(length(min = 1, max = 300))]
    pub location_found: String,
    pub found_at: Timestamp,
    #[validate(length(min = 1, max = 10))]
    pub image_urls: Vec<String>,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn dto(images: Vec<String>) -> CreateFoundItem {
        CreateFoundItem {
            name: "Blue Wallet".to_string(),
            description: "Leather, two cards inside".to_string(),
            category: "wallet".to_string(),
            location_found: "Library 2nd floor".to_string(),
            found_at: Utc::now(),
            image_urls: images,
        }
    }

    #[test]
    fn found_item_requires_an_image() {
        assert!(dto(vec![]).validate().is_err());
        assert!(dto(vec!["https://img/1.jpg".to_string()]).validate().is_ok());
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut input = dto(vec!["https://img/1.jpg".to_string()]);
        input.name = String::new();
        assert!(input.validate().is_err());
    }
}
