use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::info;

use crate::matching::reporter::MatchResult;
use crate::models::candidate::CandidateProfile;
use crate::models::job::JobPosting;
use crate::store::{ProfileStore, StoreError};

/// Seed document for the in-memory store: `{"candidates": [...], "jobs": [...]}`.
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub candidates: Vec<CandidateProfile>,
    #[serde(default)]
    pub jobs: Vec<JobPosting>,
}

#[derive(Default)]
struct Inner {
    candidates: BTreeMap<String, CandidateProfile>,
    jobs: BTreeMap<String, JobPosting>,
    results: Vec<MatchResult>,
}

/// Process-local store used when no database is configured, and in tests.
#[derive(Default)]
pub struct MemoryProfileStore {
    inner: RwLock<Inner>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: SeedData) -> Self {
        let inner = Inner {
            candidates: seed
                .candidates
                .into_iter()
                .map(|c| (c.id.clone(), c))
                .collect(),
            jobs: seed.jobs.into_iter().map(|j| (j.id.clone(), j)).collect(),
            results: Vec::new(),
        };
        Self {
            inner: RwLock::new(inner),
        }
    }

    pub fn from_seed_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;
        let seed: SeedData = serde_json::from_str(&raw)
            .with_context(|| format!("Seed file '{}' is not valid JSON", path.display()))?;
        info!(
            "Loaded {} candidates and {} jobs from {}",
            seed.candidates.len(),
            seed.jobs.len(),
            path.display()
        );
        Ok(Self::from_seed(seed))
    }

    #[cfg(test)]
    pub async fn insert_candidate(&self, candidate: CandidateProfile) {
        self.inner
            .write()
            .await
            .candidates
            .insert(candidate.id.clone(), candidate);
    }

    #[cfg(test)]
    pub async fn insert_job(&self, job: JobPosting) {
        self.inner.write().await.jobs.insert(job.id.clone(), job);
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn fetch_candidate(&self, id: &str) -> Result<Option<CandidateProfile>, StoreError> {
        Ok(self.inner.read().await.candidates.get(id).cloned())
    }

    async fn fetch_job(&self, id: &str) -> Result<Option<JobPosting>, StoreError> {
        Ok(self.inner.read().await.jobs.get(id).cloned())
    }

    async fn persist_result(&self, result: &MatchResult) -> Result<(), StoreError> {
        self.inner.write().await.results.push(result.clone());
        Ok(())
    }

    async fn result_history(
        &self,
        candidate_id: &str,
        job_id: &str,
    ) -> Result<Vec<MatchResult>, StoreError> {
        let inner = self.inner.read().await;
        let mut history: Vec<MatchResult> = inner
            .results
            .iter()
            .filter(|r| r.candidate_id == candidate_id && r.job_id == job_id)
            .cloned()
            .collect();
        history.sort_by_key(|r| r.computed_at);
        Ok(history)
    }

    async fn list_open_job_ids(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .jobs
            .values()
            .filter(|j| j.is_open)
            .map(|j| j.id.clone())
            .collect())
    }

    async fn list_candidate_ids(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.inner.read().await.candidates.keys().cloned().collect())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
