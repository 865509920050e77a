use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::matching::reporter::MatchResult;
use crate::models::candidate::{CandidateProfile, CandidateRow};
use crate::models::job::{JobPosting, JobRow};
use crate::models::match_result::MatchResultRow;
use crate::store::{ProfileStore, StoreError};

/// PostgreSQL-backed store. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn fetch_candidate(&self, id: &str) -> Result<Option<CandidateProfile>, StoreError> {
        let row = sqlx::query_as::<_, CandidateRow>("SELECT * FROM candidates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            CandidateProfile::try_from(row).map_err(|reason| StoreError::Corrupt {
                table: "candidates",
                id: id.to_string(),
                reason,
            })
        })
        .transpose()
    }

    async fn fetch_job(&self, id: &str) -> Result<Option<JobPosting>, StoreError> {
        let row = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            JobPosting::try_from(row).map_err(|reason| StoreError::Corrupt {
                table: "jobs",
                id: id.to_string(),
                reason,
            })
        })
        .transpose()
    }

    async fn persist_result(&self, result: &MatchResult) -> Result<(), StoreError> {
        let id = Uuid::new_v4();
        let dimensions = serde_json::to_value(&result.dimensions)?;

        // Append-only: results are never UPDATEd
        sqlx::query(
            r#"
            INSERT INTO match_results
                (id, candidate_id, job_id, score, dimensions, rationale, computed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(&result.candidate_id)
        .bind(&result.job_id)
        .bind(result.score)
        .bind(&dimensions)
        .bind(&result.rationale)
        .bind(result.computed_at)
        .execute(&self.pool)
        .await?;

        debug!(
            "Inserted match result {id} for candidate {} / job {}",
            result.candidate_id, result.job_id
        );
        Ok(())
    }

    async fn result_history(
        &self,
        candidate_id: &str,
        job_id: &str,
    ) -> Result<Vec<MatchResult>, StoreError> {
        let rows = sqlx::query_as::<_, MatchResultRow>(
            r#"
            SELECT * FROM match_results
            WHERE candidate_id = $1 AND job_id = $2
            ORDER BY computed_at ASC, id ASC
            "#,
        )
        .bind(candidate_id)
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<MatchResult, StoreError> {
                Ok(MatchResult {
                    candidate_id: row.candidate_id,
                    job_id: row.job_id,
                    score: row.score,
                    dimensions: serde_json::from_value(row.dimensions)?,
                    rationale: row.rationale,
                    computed_at: row.computed_at,
                })
            })
            .collect()
    }

    async fn list_open_job_ids(&self) -> Result<Vec<String>, StoreError> {
        Ok(
            sqlx::query_scalar::<_, String>("SELECT id FROM jobs WHERE is_open ORDER BY id")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn list_candidate_ids(&self) -> Result<Vec<String>, StoreError> {
        Ok(sqlx::query_scalar::<_, String>("SELECT id FROM candidates ORDER BY id")
            .fetch_all(&self.pool)
            .await?)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
