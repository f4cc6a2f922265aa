use axum::routing::post;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// POST   /matching/run     run_matching
/// POST   /expiry/run       run_expiry
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/matching/run", post(admin::run_matching))
        .route("/expiry/run", post(admin::run_expiry))
}
