//! Storage collaborators for the matching pipeline.
//!
//! `ProfileStore` is the only way the pipeline reaches persistent data. Profiles
//! are read-only here; match results are insert-only.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::matching::reporter::MatchResult;
use crate::models::candidate::CandidateProfile;
use crate::models::job::JobPosting;

pub use memory::MemoryProfileStore;
pub use postgres::PgProfileStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt {table} row '{id}': {reason}")]
    Corrupt {
        table: &'static str,
        id: String,
        reason: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn fetch_candidate(&self, id: &str) -> Result<Option<CandidateProfile>, StoreError>;

    async fn fetch_job(&self, id: &str) -> Result<Option<JobPosting>, StoreError>;

    /// Appends a result. Never overwrites an earlier one.
    async fn persist_result(&self, result: &MatchResult) -> Result<(), StoreError>;

    /// All persisted results for the pair, oldest first.
    async fn result_history(
        &self,
        candidate_id: &str,
        job_id: &str,
    ) -> Result<Vec<MatchResult>, StoreError>;

    async fn list_open_job_ids(&self) -> Result<Vec<String>, StoreError>;

    async fn list_candidate_ids(&self) -> Result<Vec<String>, StoreError>;

    /// "postgres" | "memory", reported by the health endpoint.
    fn backend(&self) -> &'static str;
}
