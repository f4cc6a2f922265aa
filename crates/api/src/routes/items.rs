//! Route definitions for lost and found item reports.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::items;
use crate::state::AppState;

/// Routes mounted at `/lost-items`.
///
/// ```text
/// POST   /                 report_lost
/// GET    /mine             list_my_lost
/// GET    /{id}             get_lost
/// GET    /{id}/matches     lost_matches
/// ```
pub fn lost_router() -> Router<AppState> {
    Router::new()
        .route("/", post(items::report_lost))
        .route("/mine", get(items::list_my_lost))
        .route("/{id}", get(items::get_lost))
        .route("/{id}/matches", get(items::lost_matches))
}

/// Routes mounted at `/found-items`.
///
/// ```text
/// GET    /                 list_found
/// POST   /                 report_found
/// GET    /mine             list_my_found
/// GET    /{id}             get_found
/// GET    /{id}/matches     found_matches
/// ```
pub fn found_router() -> Router<AppState> {
    Router::new()
        .route("/", get(items::list_found).post(items::report_found))
        .route("/mine", get(items::list_my_found))
        .route("/{id}", get(items::get_found))
        .route("/{id}/matches", get(items::found_matches))
}
