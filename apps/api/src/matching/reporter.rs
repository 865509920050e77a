use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::matching::aggregator::Aggregate;
use crate::matching::error::MatchError;
use crate::matching::scorer::SubScores;
use crate::store::ProfileStore;

/// Stable output shape of one scoring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub candidate_id: String,
    pub job_id: String,
    /// 0 – 100, one decimal place.
    pub score: f64,
    pub dimensions: SubScores,
    pub rationale: String,
    pub computed_at: DateTime<Utc>,
}

/// Packages results and writes them to the audit trail.
#[derive(Clone)]
pub struct ResultReporter {
    store: Arc<dyn ProfileStore>,
}

impl ResultReporter {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    pub fn package(
        candidate_id: &str,
        job_id: &str,
        dimensions: SubScores,
        aggregate: Aggregate,
        computed_at: DateTime<Utc>,
    ) -> MatchResult {
        MatchResult {
            candidate_id: candidate_id.to_string(),
            job_id: job_id.to_string(),
            score: aggregate.score,
            dimensions,
            rationale: aggregate.rationale,
            computed_at,
        }
    }

    /// Insert-only; prior results for the pair are left untouched.
    pub async fn persist(&self, result: &MatchResult) -> Result<(), MatchError> {
        self.store.persist_result(result).await?;
        info!(
            "Persisted match {}/{} = {} at {}",
            result.candidate_id, result.job_id, result.score, result.computed_at
        );
        Ok(())
    }

    pub async fn history(
        &self,
        candidate_id: &str,
        job_id: &str,
    ) -> Result<Vec<MatchResult>, MatchError> {
        Ok(self.store.result_history(candidate_id, job_id).await?)
    }
}
