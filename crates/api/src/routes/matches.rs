use axum::routing::{get, post};
use axum::Router;

use crate::handlers::matches;
use crate::state::AppState;

/// Routes mounted at `/matches`.
///
/// ```text
/// POST   /                 create_manual (admin)
/// POST   /batch            ingest_batch (service/admin)
/// GET    /stats            stats
/// GET    /{id}             get_match
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(matches::create_manual))
        .route("/batch", post(matches::ingest_batch))
        .route("/stats", get(matches::stats))
        .route("/{id}", get(matches::get_match))
}
