use std::sync::Arc;

use crate::config::Config;
use crate::matching::service::MatchService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Built once in `main` with its store, scorer, weights and cache.
    pub matcher: Arc<MatchService>,
}
