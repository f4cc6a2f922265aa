//! Keyed store with per-key expiry, and a fixed-window rate limiter on top.
//!
//! [`KeyValueStore`] is the seam: [`InMemoryStore`] backs a single process,
//! and any keyed store with TTL support (Redis, a database table) can
//! implement the same trait without touching callers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::CoreError;
use crate::types::DbId;

/// Keyed string store with optional per-key time-to-live.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a live value.
    async fn get(&self, key: &str) -> Option<String>;

    /// Write a value, replacing any previous one. `None` means no expiry.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>);

    /// Set or replace the expiry of an existing key. Returns `false` if absent.
    async fn expire(&self, key: &str, ttl: Duration) -> bool;

    /// Remove a key. Returns `true` if it existed.
    async fn delete(&self, key: &str) -> bool;

    /// Atomically increment an integer counter, creating it with `ttl` when
    /// absent. Existing counters keep their expiry. Returns the new value.
    async fn incr(&self, key: &str, ttl: Duration) -> i64;

    /// Drop every expired key, returning how many were removed. Stores that
    /// expire keys themselves keep the default.
    async fn purge_expired(&self) -> usize {
        0
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(at) => at > now,
            None => true,
        }
    }
}

/// Process-local [`KeyValueStore`]. Expired keys are dropped lazily on
/// access and eagerly by [`InMemoryStore::purge_expired`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held, including not-yet-purged expired ones.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.is_live(now) => return Some(entry.value.clone()),
                None => return None,
                Some(_) => {}
            }
        }
        self.entries.write().await.remove(key);
        None
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries
            .write()
            .await
            .insert(key.to_string(), Entry { value, expires_at });
    }

    async fn expire(&self, key: &str, ttl: Duration) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        match entries.get_mut(key) {
            Some(entry) if entry.is_live(now) => {
                entry.expires_at = Some(now + ttl);
                true
            }
            _ => false,
        }
    }

    async fn delete(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    async fn incr(&self, key: &str, ttl: Duration) -> i64 {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(key.to_string())
            .and_modify(|entry| {
                if !entry.is_live(now) {
                    entry.value = "0".to_string();
                    entry.expires_at = Some(now + ttl);
                }
            })
            .or_insert_with(|| Entry {
                value: "0".to_string(),
                expires_at: Some(now + ttl),
            });
        let next = entry.value.parse::<i64>().unwrap_or(0) + 1;
        entry.value = next.to_string();
        next
    }

    async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }
}

// ---------------------------------------------------------------------------
// Rate limiting
// ---------------------------------------------------------------------------

/// Default claim submissions allowed per user per window.
pub const DEFAULT_CLAIMS_PER_HOUR: i64 = 10;

/// Default item reports allowed per user per window.
pub const DEFAULT_REPORTS_PER_HOUR: i64 = 20;

/// Per-user limits applied by the HTTP layer.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub claims_per_hour: i64,
    pub reports_per_hour: i64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            claims_per_hour: DEFAULT_CLAIMS_PER_HOUR,
            reports_per_hour: DEFAULT_REPORTS_PER_HOUR,
        }
    }
}

/// Fixed-window counter keyed by `(action, user)`.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn KeyValueStore>,
    window: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn KeyValueStore>, window: Duration) -> Self {
        Self { store, window }
    }

    /// Hourly windows backed by `store`.
    pub fn hourly(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(store, Duration::from_secs(3600))
    }

    /// Count one `action` by `user_id`, failing once `limit` is exceeded.
    pub async fn check(&self, action: &str, user_id: DbId, limit: i64) -> Result<(), CoreError> {
        let key = format!("ratelimit:{action}:{user_id}");
        let count = self.store.incr(&key, self.window).await;
        if count > limit {
            tracing::warn!(action, user_id, count, limit, "Rate limit exceeded");
            return Err(CoreError::RateLimited(format!(
                "Too many {action} requests; try again later"
            )));
        }
        Ok(())
    }

    /// Drop counters whose window has closed.
    pub async fn purge_expired(&self) -> usize {
        let purged = self.store.purge_expired().await;
        if purged > 0 {
            tracing::debug!(purged, "Purged expired rate-limit windows");
        }
        purged
    }
}
