//! Item expiry rules and scheduler intervals.

use std::time::Duration;

use chrono::Utc;

use crate::status::{FoundItemStatus, LostItemStatus};
use crate::types::Timestamp;

/// Lost item reports expire after this many days without resolution.
pub const DEFAULT_LOST_ITEM_TTL_DAYS: i64 = 30;

/// Found item reports expire after this many days without being claimed.
pub const DEFAULT_FOUND_ITEM_TTL_DAYS: i64 = 60;

/// Lost item statuses the expiry sweep may move to `expired`.
pub const EXPIRABLE_LOST_STATUSES: &[LostItemStatus] =
    &[LostItemStatus::Active, LostItemStatus::HasMatches];

/// Found item statuses the expiry sweep may move to `expired`.
pub const EXPIRABLE_FOUND_STATUSES: &[FoundItemStatus] =
    &[FoundItemStatus::Available, FoundItemStatus::PendingClaim];

/// Ages after which open reports expire.
#[derive(Debug, Clone)]
pub struct ExpiryPolicy {
    pub lost_item_ttl_days: i64,
    pub found_item_ttl_days: i64,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            lost_item_ttl_days: DEFAULT_LOST_ITEM_TTL_DAYS,
            found_item_ttl_days: DEFAULT_FOUND_ITEM_TTL_DAYS,
        }
    }
}

impl ExpiryPolicy {
    /// Lost items created before this instant are due for expiry.
    pub fn lost_cutoff(&self, now: Timestamp) -> Timestamp {
        now - chrono::Duration::days(self.lost_item_ttl_days)
    }

    /// Found items created before this instant are due for expiry.
    pub fn found_cutoff(&self, now: Timestamp) -> Timestamp {
        now - chrono::Duration::days(self.found_item_ttl_days)
    }

    /// Whether a lost item is due, ignoring in-flight claim guards.
    pub fn lost_item_due(&self, status: LostItemStatus, created_at: Timestamp) -> bool {
        EXPIRABLE_LOST_STATUSES.contains(&status) && created_at < self.lost_cutoff(Utc::now())
    }

    /// Whether a found item is due, ignoring in-flight claim guards.
    pub fn found_item_due(&self, status: FoundItemStatus, created_at: Timestamp) -> bool {
        EXPIRABLE_FOUND_STATUSES.contains(&status) && created_at < self.found_cutoff(Utc::now())
    }
}

/// Default interval between background matching passes (2 hours).
pub const DEFAULT_MATCH_INTERVAL: Duration = Duration::from_secs(2 * 3600);

/// Default interval between expiry sweeps (daily).
pub const DEFAULT_EXPIRY_INTERVAL: Duration = Duration::from_secs(24 * 3600);

/// Default interval between similarity service health checks.
pub const DEFAULT_HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(600);

/// Intervals for the periodic reconciliation tasks.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub match_interval: Duration,
    pub expiry_interval: Duration,
    pub health_check_interval: Duration,
    pub expiry: ExpiryPolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            match_interval: DEFAULT_MATCH_INTERVAL,
            expiry_interval: DEFAULT_EXPIRY_INTERVAL,
            health_check_interval: DEFAULT_HEALTH_CHECK_INTERVAL,
            expiry: ExpiryPolicy::default(),
        }
    }
}
