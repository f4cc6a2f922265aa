use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the database is reachable.
    pub db_healthy: bool,
    /// Whether the similarity service answered its health check.
    pub similarity_healthy: bool,
}

/// GET /health -- database and similarity service health.
///
/// A similarity outage only degrades matching, so the status stays `ok`
/// as long as the database is up.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = lostfound_db::health_check(&state.pool).await.is_ok();
    let similarity_healthy = state.reconciler.check_health().await;

    let status = if db_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        similarity_healthy,
    })
}

/// Mount health check routes (root level, not under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
