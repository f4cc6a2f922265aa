//! Handlers for match queries, manual matches and batch ingest.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use lostfound_core::matching::{MatchCandidate, MatchSource};
use lostfound_core::types::DbId;
use lostfound_db::models::item_match::{CreateManualMatch, IngestBatch};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireIngest};
use crate::response::DataResponse;
use crate::state::AppState;

/// Largest batch accepted by the ingest endpoint.
const MAX_INGEST_BATCH: usize = 1000;

/// POST /api/v1/matches
///
/// Operator override: the similarity is set exactly, bypassing monotonicity.
pub async fn create_manual(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateManualMatch>,
) -> AppResult<impl IntoResponse> {
    let m = state.orchestrator.create_manual(&input).await?;
    tracing::info!(
        match_id = m.id,
        admin_id = admin.user_id,
        similarity = m.similarity,
        "Manual match recorded"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: m })))
}

/// POST /api/v1/matches/batch
///
/// Results pushed by the similarity service. Per-candidate failures are
/// counted in the summary and never fail the request.
pub async fn ingest_batch(
    RequireIngest(client): RequireIngest,
    State(state): State<AppState>,
    Json(input): Json<IngestBatch>,
) -> AppResult<impl IntoResponse> {
    if input.candidates.is_empty() {
        return Err(AppError::BadRequest("Batch must not be empty".to_string()));
    }
    if input.candidates.len() > MAX_INGEST_BATCH {
        return Err(AppError::BadRequest(format!(
            "Batch must contain at most {MAX_INGEST_BATCH} candidates"
        )));
    }

    let candidates: Vec<MatchCandidate> = input
        .candidates
        .into_iter()
        .map(|c| MatchCandidate {
            lost_item_id: c.lost_item_id,
            found_item_id: c.found_item_id,
            similarity: c.similarity,
            match_type: c.match_type,
            source: MatchSource::Background,
        })
        .collect();
    let summary = state.orchestrator.submit_batch(&candidates).await;
    tracing::info!(
        client_id = client.user_id,
        received = candidates.len(),
        created = summary.created,
        updated = summary.updated,
        failed = summary.failed,
        "Match batch ingested"
    );
    Ok(Json(DataResponse { data: summary }))
}

/// GET /api/v1/matches/stats
pub async fn stats(_auth: AuthUser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let stats = state.orchestrator.stats().await?;
    Ok(Json(DataResponse { data: stats }))
}

/// GET /api/v1/matches/{id}
///
/// Visible to the lost item's owner, the finder and admins.
pub async fn get_match(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let m = state
        .orchestrator
        .get(id, auth.user_id, auth.is_admin())
        .await?;
    Ok(Json(DataResponse { data: m }))
}
