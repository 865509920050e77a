use axum::{extract::State, Json};

use crate::admin::commands::{execute, AdminCommand, AdminOutcome};
use crate::errors::AppError;
use crate::state::AppState;

/// POST /api/v1/admin/commands
///
/// Body is a tagged command, e.g. `{"command": "score_match", "candidate_id": "..", "job_id": ".."}`.
/// Unknown command names are rejected by the JSON extractor.
pub async fn handle_admin_command(
    State(state): State<AppState>,
    Json(command): Json<AdminCommand>,
) -> Result<Json<AdminOutcome>, AppError> {
    let outcome = execute(&state.matcher, command, state.config.rank_limit).await?;
    Ok(Json(outcome))
}
