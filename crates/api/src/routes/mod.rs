pub mod admin;
pub mod claims;
pub mod health;
pub mod items;
pub mod matches;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /lost-items                          report (POST)
/// /lost-items/mine                     caller's lost items
/// /lost-items/{id}                     get
/// /lost-items/{id}/matches             owner only
///
/// /found-items                         list by status (GET), report (POST)
/// /found-items/mine                    caller's found items
/// /found-items/{id}                    get
/// /found-items/{id}/matches            finder only
/// /found-items/{id}/claims             list (finder only), create
///
/// /claims/mine                         caller's claims
/// /claims/{id}                         get, cancel (DELETE)
/// /claims/{id}/review                  approve or reject (finder only)
///
/// /matches                             manual match (admin)
/// /matches/batch                       batch ingest (service/admin)
/// /matches/stats                       aggregate statistics
/// /matches/{id}                        get (parties or admin)
///
/// /admin/matching/run                  background matching pass (admin)
/// /admin/expiry/run                    expiry pass (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/lost-items", items::lost_router())
        .nest("/found-items", items::found_router().merge(claims::found_item_router()))
        .nest("/claims", claims::router())
        .nest("/matches", matches::router())
        .nest("/admin", admin::router())
}
