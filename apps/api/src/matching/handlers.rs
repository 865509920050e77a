//! Axum route handlers for the Matching API.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::matching::reporter::MatchResult;
use crate::matching::service::{Ranking, ScoreOptions};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub candidate_id: String,
    pub job_id: String,
    #[serde(flatten)]
    pub options: ScoreOptions,
}

#[derive(Debug, Deserialize)]
pub struct PairQuery {
    pub candidate_id: String,
    pub job_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RankRequest {
    pub candidate_id: String,
    pub limit: Option<usize>,
}

fn require_id(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/matches
///
/// Scores one candidate against one job. `persist: true` appends the result to
/// the audit trail; `fresh: true` bypasses the result cache.
pub async fn handle_score_match(
    State(state): State<AppState>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<MatchResult>, AppError> {
    require_id("candidate_id", &request.candidate_id)?;
    require_id("job_id", &request.job_id)?;

    let result = state
        .matcher
        .score(&request.candidate_id, &request.job_id, request.options)
        .await?;

    Ok(Json(result))
}

/// GET /api/v1/matches/history?candidate_id=..&job_id=..
///
/// Persisted results for the pair, oldest first.
pub async fn handle_match_history(
    State(state): State<AppState>,
    Query(params): Query<PairQuery>,
) -> Result<Json<Vec<MatchResult>>, AppError> {
    require_id("candidate_id", &params.candidate_id)?;
    require_id("job_id", &params.job_id)?;

    let history = state
        .matcher
        .history(&params.candidate_id, &params.job_id)
        .await?;
    Ok(Json(history))
}

/// POST /api/v1/matches/rank
///
/// Scores the candidate against every open job and returns the best matches.
pub async fn handle_rank_jobs(
    State(state): State<AppState>,
    Json(request): Json<RankRequest>,
) -> Result<Json<Ranking>, AppError> {
    require_id("candidate_id", &request.candidate_id)?;

    let limit = request.limit.unwrap_or(state.config.rank_limit);
    let ranking = state
        .matcher
        .rank_jobs_for_candidate(&request.candidate_id, limit)
        .await?;

    Ok(Json(ranking))
}
