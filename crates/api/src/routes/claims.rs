//! Route definitions for the claim workflow.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::claims;
use crate::state::AppState;

/// Claim routes merged into `/found-items`.
///
/// ```text
/// GET    /{id}/claims      list_for_found_item
/// POST   /{id}/claims      create_claim
/// ```
pub fn found_item_router() -> Router<AppState> {
    Router::new().route(
        "/{id}/claims",
        get(claims::list_for_found_item).post(claims::create_claim),
    )
}

/// Routes mounted at `/claims`.
///
/// ```text
/// GET    /mine             list_mine
/// GET    /{id}             get_claim
/// DELETE /{id}             cancel_claim
/// POST   /{id}/review      review_claim
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/mine", get(claims::list_mine))
        .route("/{id}", get(claims::get_claim).delete(claims::cancel_claim))
        .route("/{id}/review", post(claims::review_claim))
}
