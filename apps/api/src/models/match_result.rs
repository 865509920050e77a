use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One persisted scoring run. Rows are insert-only; score drift shows up as new rows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchResultRow {
    pub id: Uuid,
    pub candidate_id: String,
    pub job_id: String,
    pub score: f64,
    pub dimensions: Value,
    pub rationale: String,
    pub computed_at: DateTime<Utc>,
}
