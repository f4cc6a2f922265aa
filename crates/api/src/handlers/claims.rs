//! Handlers for the claim workflow.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use lostfound_core::types::DbId;
use lostfound_db::models::claim::{CreateClaim, ReviewClaimRequest};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/found-items/{id}/claims
pub async fn create_claim(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(found_item_id): Path<DbId>,
    Json(input): Json<CreateClaim>,
) -> AppResult<impl IntoResponse> {
    state
        .rate_limiter
        .check("claim", auth.user_id, state.config.rate_limits.claims_per_hour)
        .await?;
    let claim = state
        .claims
        .create_claim(found_item_id, auth.user_id, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: claim })))
}

/// GET /api/v1/found-items/{id}/claims
///
/// Finder (or admin) only.
pub async fn list_for_found_item(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(found_item_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let claims = state
        .claims
        .list_for_found_item(found_item_id, auth.user_id, auth.is_admin())
        .await?;
    Ok(Json(DataResponse { data: claims }))
}

/// GET /api/v1/claims/mine
pub async fn list_mine(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = params.clamped();
    let claims = state.claims.list_mine(auth.user_id, limit, offset).await?;
    Ok(Json(DataResponse { data: claims }))
}

/// GET /api/v1/claims/{id}
pub async fn get_claim(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let claim = state.claims.get(id, auth.user_id, auth.is_admin()).await?;
    Ok(Json(DataResponse { data: claim }))
}

/// POST /api/v1/claims/{id}/review
pub async fn review_claim(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReviewClaimRequest>,
) -> AppResult<impl IntoResponse> {
    let claim = state.claims.review_claim(id, auth.user_id, &input).await?;
    Ok(Json(DataResponse { data: claim }))
}

/// DELETE /api/v1/claims/{id}
pub async fn cancel_claim(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.claims.cancel_claim(id, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
