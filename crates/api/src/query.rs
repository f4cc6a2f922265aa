//! Shared query parameter types for API handlers.

use lostfound_core::status::FoundItemStatus;
use lostfound_db::{clamp_limit, clamp_offset};
use serde::Deserialize;

/// Generic pagination parameters (`?limit=&offset=`).
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// `(limit, offset)` clamped to the repository bounds.
    pub fn clamped(&self) -> (i64, i64) {
        (clamp_limit(self.limit), clamp_offset(self.offset))
    }
}

/// `GET /found-items?status=&limit=&offset=`. Defaults to `available`.
#[derive(Debug, Deserialize)]
pub struct FoundItemListParams {
    pub status: Option<FoundItemStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
