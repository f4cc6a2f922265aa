//! On-demand triggers for the reconciliation passes (admin only).

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/admin/matching/run
pub async fn run_matching(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    tracing::info!(admin_id = admin.user_id, "Manual matching pass requested");
    let summary = state.reconciler.run_matching_pass().await?;
    Ok(Json(DataResponse { data: summary }))
}

/// POST /api/v1/admin/expiry/run
pub async fn run_expiry(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    tracing::info!(admin_id = admin.user_id, "Manual expiry pass requested");
    let summary = state.reconciler.run_expiry_pass().await?;
    Ok(Json(DataResponse { data: summary }))
}
