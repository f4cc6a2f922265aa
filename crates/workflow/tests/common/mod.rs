//! Shared fixtures for workflow integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use lostfound_core::matching::{MatchCandidate, MatchSource, MatchType, MatchingConfig};
use lostfound_core::retry::RetryPolicy;
use lostfound_core::types::DbId;
use lostfound_core::expiry::ExpiryPolicy;
use lostfound_db::models::found_item::{CreateFoundItem, FoundItem};
use lostfound_db::models::lost_item::{CreateLostItem, LostItem};
use lostfound_db::models::user::CreateUser;
use lostfound_db::repositories::{FoundItemRepo, LostItemRepo, UserRepo};
use lostfound_events::{EventBus, PlatformEvent};
use lostfound_similarity::{
    BackgroundMatch, InstantMatch, ItemFeatures, SimilarityError, SimilarityService,
};
use lostfound_workflow::{ClaimWorkflow, ItemService, MatchOrchestrator, Reconciler};
use sqlx::PgPool;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Fake similarity service
// ---------------------------------------------------------------------------

/// Scripted similarity service.
#[derive(Default)]
pub struct FakeSimilarity {
    pub instant: Mutex<Vec<InstantMatch>>,
    pub background: Mutex<Vec<BackgroundMatch>>,
    pub failing: AtomicBool,
    pub calls: AtomicU32,
}

impl FakeSimilarity {
    pub fn set_instant(&self, hits: Vec<InstantMatch>) {
        *self.instant.lock().unwrap() = hits;
    }

    pub fn set_background(&self, pairs: Vec<BackgroundMatch>) {
        *self.background.lock().unwrap() = pairs;
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), SimilarityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(SimilarityError::HttpStatus {
                status: 503,
                body: "AI models not loaded".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SimilarityService for FakeSimilarity {
    async fn match_instant(
        &self,
        _features: &ItemFeatures,
    ) -> Result<Vec<InstantMatch>, SimilarityError> {
        self.check()?;
        Ok(self.instant.lock().unwrap().clone())
    }

    async fn match_background(
        &self,
        _limit: i64,
        _threshold: f64,
    ) -> Result<Vec<BackgroundMatch>, SimilarityError> {
        self.check()?;
        Ok(self.background.lock().unwrap().clone())
    }

    async fn health(&self) -> bool {
        !self.failing.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub pool: PgPool,
    pub events: Arc<EventBus>,
    pub rx: broadcast::Receiver<PlatformEvent>,
    pub similarity: Arc<FakeSimilarity>,
    pub orchestrator: MatchOrchestrator,
    pub claims: ClaimWorkflow,
    pub items: ItemService,
    pub reconciler: Reconciler,
}

pub fn harness(pool: PgPool) -> Harness {
    let events = Arc::new(EventBus::default());
    let rx = events.subscribe();
    let similarity = Arc::new(FakeSimilarity::default());
    let orchestrator =
        MatchOrchestrator::new(pool.clone(), events.clone(), MatchingConfig::default());
    let fast_retry = RetryPolicy {
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(2),
        ..RetryPolicy::default()
    };
    Harness {
        claims: ClaimWorkflow::new(pool.clone(), events.clone()),
        items: ItemService::new(
            pool.clone(),
            similarity.clone(),
            orchestrator.clone(),
            fast_retry,
        ),
        reconciler: Reconciler::new(
            pool.clone(),
            similarity.clone(),
            orchestrator.clone(),
            ExpiryPolicy::default(),
        ),
        orchestrator,
        similarity,
        events,
        rx,
        pool,
    }
}

impl Harness {
    /// Every event published since the last drain.
    pub fn drain_events(&mut self) -> Vec<PlatformEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub async fn user(pool: &PgPool, name: &str) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            display_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            phone: Some("+6281234567890".to_string()),
        },
    )
    .await
    .unwrap()
    .id
}

pub fn lost_dto(name: &str) -> CreateLostItem {
    CreateLostItem {
        name: name.to_string(),
        description: format!("{name}, lost near the library"),
        category: "personal".to_string(),
        last_seen_location: "Central Library".to_string(),
        date_lost: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        reward_cents: None,
        image_urls: Vec::new(),
    }
}

pub fn found_dto(name: &str) -> CreateFoundItem {
    CreateFoundItem {
        name: name.to_string(),
        description: format!("{name}, found on a bench"),
        category: "personal".to_string(),
        location_found: "Central Library".to_string(),
        found_at: Utc::now(),
        image_urls: vec!["https://images.example.com/found.jpg".to_string()],
    }
}

pub async fn lost_item(pool: &PgPool, owner_id: DbId, name: &str) -> LostItem {
    LostItemRepo::create(pool, owner_id, &lost_dto(name))
        .await
        .unwrap()
}

pub async fn found_item(pool: &PgPool, finder_id: DbId, name: &str) -> FoundItem {
    FoundItemRepo::create(pool, finder_id, &found_dto(name))
        .await
        .unwrap()
}

pub fn candidate(
    lost_item_id: DbId,
    found_item_id: DbId,
    similarity: f64,
    match_type: MatchType,
) -> MatchCandidate {
    MatchCandidate {
        lost_item_id,
        found_item_id,
        similarity,
        match_type,
        source: MatchSource::Background,
    }
}

/// Backdate a row's `created_at` by `days`.
pub async fn age(pool: &PgPool, table: &str, id: DbId, days: i64) {
    sqlx::query(&format!(
        "UPDATE {table} SET created_at = NOW() - make_interval(days => $2) WHERE id = $1"
    ))
    .bind(id)
    .bind(days as i32)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn match_count(pool: &PgPool, lost_item_id: DbId, found_item_id: DbId) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM matches WHERE lost_item_id = $1 AND found_item_id = $2",
    )
    .bind(lost_item_id)
    .bind(found_item_id)
    .fetch_one(pool)
    .await
    .unwrap()
}
