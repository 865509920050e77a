use thiserror::Error;

use crate::store::StoreError;

/// Failure of a single match computation. A computation either fully succeeds
/// or fails with one of these; no partial results are returned.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("Invalid weighting configuration: {0}")]
    Configuration(String),

    #[error("Timed out retrieving {what} after {attempts} attempt(s)")]
    RetrievalTimeout { what: String, attempts: u32 },

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl MatchError {
    /// Stable machine-readable code, shared by HTTP bodies and batch failure entries.
    pub fn code(&self) -> &'static str {
        match self {
            MatchError::NotFound { .. } => "NOT_FOUND",
            MatchError::Configuration(_) => "CONFIGURATION_ERROR",
            MatchError::RetrievalTimeout { .. } => "RETRIEVAL_TIMEOUT",
            MatchError::Store(_) => "STORAGE_ERROR",
        }
    }

    pub fn candidate_not_found(id: &str) -> Self {
        MatchError::NotFound {
            what: format!("Candidate '{id}'"),
        }
    }

    pub fn job_not_found(id: &str) -> Self {
        MatchError::NotFound {
            what: format!("Job '{id}'"),
        }
    }
}
