use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::archive::{dashboard_stats, list_candidates, CandidateSummary, DashboardStats, SortOrder};
use crate::errors::AppError;
use crate::interview::models::CandidateResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub sort: SortOrder,
}

/// GET /api/v1/candidates?q=&sort=
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Json<Vec<CandidateSummary>> {
    let results = state.controller.persistence().load_archive().await;
    Json(list_candidates(&results, &params.q, params.sort))
}

/// GET /api/v1/candidates/stats
pub async fn handle_candidate_stats(State(state): State<AppState>) -> Json<DashboardStats> {
    let results = state.controller.persistence().load_archive().await;
    Json(dashboard_stats(&results))
}

/// GET /api/v1/candidates/:id
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CandidateResult>, AppError> {
    state
        .controller
        .persistence()
        .find_result(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))
}
