//! Handlers for lost and found item reports.
//!
//! Reporting an item saves it and runs instant matching in the same request;
//! the response says whether matching completed or was deferred.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use lostfound_core::status::FoundItemStatus;
use lostfound_core::types::DbId;
use lostfound_db::models::found_item::CreateFoundItem;
use lostfound_db::models::lost_item::CreateLostItem;
use lostfound_db::{clamp_limit, clamp_offset};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::{FoundItemListParams, PaginationParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// Rate-limit bucket shared by both report endpoints.
const REPORT_ACTION: &str = "report";

/// POST /api/v1/lost-items
pub async fn report_lost(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateLostItem>,
) -> AppResult<impl IntoResponse> {
    state
        .rate_limiter
        .check(REPORT_ACTION, auth.user_id, state.config.rate_limits.reports_per_hour)
        .await?;
    let reported = state.items.report_lost(auth.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: reported })))
}

/// GET /api/v1/lost-items/mine
pub async fn list_my_lost(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = params.clamped();
    let items = state
        .items
        .list_lost_by_owner(auth.user_id, limit, offset)
        .await?;
    Ok(Json(DataResponse { data: items }))
}

/// GET /api/v1/lost-items/{id}
pub async fn get_lost(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let item = state.items.get_lost(id).await?;
    Ok(Json(DataResponse { data: item }))
}

/// GET /api/v1/lost-items/{id}/matches
///
/// Owner (or admin) only.
pub async fn lost_matches(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let matches = state
        .items
        .matches_for_lost(id, auth.user_id, auth.is_admin())
        .await?;
    Ok(Json(DataResponse { data: matches }))
}

/// POST /api/v1/found-items
pub async fn report_found(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateFoundItem>,
) -> AppResult<impl IntoResponse> {
    state
        .rate_limiter
        .check(REPORT_ACTION, auth.user_id, state.config.rate_limits.reports_per_hour)
        .await?;
    let reported = state.items.report_found(auth.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: reported })))
}

/// GET /api/v1/found-items?status=&limit=&offset=
pub async fn list_found(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<FoundItemListParams>,
) -> AppResult<impl IntoResponse> {
    let status = params.status.unwrap_or(FoundItemStatus::Available);
    let items = state
        .items
        .list_found_by_status(status, clamp_limit(params.limit), clamp_offset(params.offset))
        .await?;
    Ok(Json(DataResponse { data: items }))
}

/// GET /api/v1/found-items/mine
pub async fn list_my_found(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = params.clamped();
    let items = state
        .items
        .list_found_by_finder(auth.user_id, limit, offset)
        .await?;
    Ok(Json(DataResponse { data: items }))
}

/// GET /api/v1/found-items/{id}
pub async fn get_found(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let item = state.items.get_found(id).await?;
    Ok(Json(DataResponse { data: item }))
}

/// GET /api/v1/found-items/{id}/matches
///
/// Finder (or admin) only.
pub async fn found_matches(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let matches = state
        .items
        .matches_for_found(id, auth.user_id, auth.is_admin())
        .await?;
    Ok(Json(DataResponse { data: matches }))
}
