use std::sync::Arc;

use lostfound_core::retry::RetryPolicy;
use lostfound_core::ttl_store::{InMemoryStore, RateLimiter};
use lostfound_events::EventBus;
use lostfound_similarity::SimilarityService;
use lostfound_workflow::{ClaimWorkflow, ItemService, MatchOrchestrator, Reconciler};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: inner data is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: lostfound_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Notification intents are published here after each commit.
    pub event_bus: Arc<EventBus>,
    pub orchestrator: MatchOrchestrator,
    pub claims: ClaimWorkflow,
    pub items: ItemService,
    pub reconciler: Reconciler,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Wire the workflow services around one pool, bus and similarity client.
    pub fn new(
        pool: lostfound_db::DbPool,
        config: ServerConfig,
        event_bus: Arc<EventBus>,
        similarity: Arc<dyn SimilarityService>,
    ) -> Self {
        let orchestrator =
            MatchOrchestrator::new(pool.clone(), event_bus.clone(), config.matching.clone());
        let claims = ClaimWorkflow::new(pool.clone(), event_bus.clone());
        let items = ItemService::new(
            pool.clone(),
            similarity.clone(),
            orchestrator.clone(),
            RetryPolicy::default(),
        );
        let reconciler = Reconciler::new(
            pool.clone(),
            similarity,
            orchestrator.clone(),
            config.scheduler.expiry.clone(),
        );
        let rate_limiter = RateLimiter::hourly(Arc::new(InMemoryStore::new()));

        Self {
            pool,
            config: Arc::new(config),
            event_bus,
            orchestrator,
            claims,
            items,
            reconciler,
            rate_limiter,
        }
    }
}
