pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::admin::handlers as admin;
use crate::matching::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Matching API
        .route("/api/v1/matches", post(handlers::handle_score_match))
        .route(
            "/api/v1/matches/history",
            get(handlers::handle_match_history),
        )
        .route("/api/v1/matches/rank", post(handlers::handle_rank_jobs))
        // Admin API
        .route(
            "/api/v1/admin/commands",
            post(admin::handle_admin_command),
        )
        .with_state(state)
}
