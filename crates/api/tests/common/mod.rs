//! Shared helpers for HTTP integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use lostfound_api::auth::jwt::{generate_access_token, JwtConfig};
use lostfound_api::config::ServerConfig;
use lostfound_api::router::build_app_router;
use lostfound_api::state::AppState;
use lostfound_core::expiry::SchedulerConfig;
use lostfound_core::matching::MatchingConfig;
use lostfound_core::ttl_store::RateLimitConfig;
use lostfound_core::types::DbId;
use lostfound_db::models::user::CreateUser;
use lostfound_db::repositories::UserRepo;
use lostfound_events::EventBus;
use lostfound_similarity::{
    BackgroundMatch, InstantMatch, ItemFeatures, SimilarityClientConfig, SimilarityError,
    SimilarityService,
};
use sqlx::PgPool;
use tower::ServiceExt;

const TEST_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// Scripted similarity service; instant calls return `instant`.
#[derive(Default)]
pub struct StubSimilarity {
    pub instant: Mutex<Vec<InstantMatch>>,
    pub down: AtomicBool,
}

#[async_trait]
impl SimilarityService for StubSimilarity {
    async fn match_instant(
        &self,
        _features: &ItemFeatures,
    ) -> Result<Vec<InstantMatch>, SimilarityError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(SimilarityError::Decode("stub is down".to_string()));
        }
        Ok(self.instant.lock().unwrap().clone())
    }

    async fn match_background(
        &self,
        _limit: i64,
        _threshold: f64,
    ) -> Result<Vec<BackgroundMatch>, SimilarityError> {
        Ok(Vec::new())
    }

    async fn health(&self) -> bool {
        !self.down.load(Ordering::SeqCst)
    }
}

/// A `ServerConfig` with safe defaults and no environment lookups.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            access_token_expiry_mins: 15,
        },
        similarity: SimilarityClientConfig::new("http://127.0.0.1:9"),
        notification_webhook_url: None,
        matching: MatchingConfig::default(),
        scheduler: SchedulerConfig::default(),
        rate_limits: RateLimitConfig::default(),
    }
}

pub struct TestApp {
    pub router: Router,
    pub similarity: Arc<StubSimilarity>,
}

/// Build the full application router, using the same middleware stack as
/// `main.rs`.
pub fn build_test_app(pool: PgPool) -> TestApp {
    build_test_app_with(pool, test_config())
}

pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> TestApp {
    let similarity = Arc::new(StubSimilarity::default());
    let state = AppState::new(
        pool,
        config.clone(),
        Arc::new(EventBus::default()),
        similarity.clone(),
    );
    TestApp {
        router: build_app_router(state, &config),
        similarity,
    }
}

/// A bearer token for `user_id` with `role`.
pub fn token(user_id: DbId, role: &str) -> String {
    let config = JwtConfig {
        secret: TEST_SECRET.to_string(),
        access_token_expiry_mins: 15,
    };
    generate_access_token(user_id, role, &config).unwrap()
}

pub async fn create_user(pool: &PgPool, name: &str) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            display_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn lost_body(name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "description": format!("{name}, lost near the library"),
        "category": "personal",
        "last_seen_location": "Central Library",
        "date_lost": "2025-03-01",
        "image_urls": [],
    })
}

pub fn found_body(name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "description": format!("{name}, found on a bench"),
        "category": "personal",
        "location_found": "Central Library",
        "found_at": "2025-03-02T10:00:00Z",
        "image_urls": ["https://images.example.com/found.jpg"],
    })
}
