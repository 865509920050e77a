//! Profile Fetcher: the only blocking step of a match computation.
//!
//! Every store call runs under `FetchPolicy::timeout`. Timeouts are retried
//! up to `FetchPolicy::retries` times; missing profiles and store errors are not.
//! At most `FetchPolicy::max_concurrent` store calls are in flight per fetcher;
//! waiting for a slot does not count against the timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::warn;

use crate::matching::error::MatchError;
use crate::models::candidate::CandidateProfile;
use crate::models::job::JobPosting;
use crate::store::{ProfileStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    pub timeout: Duration,
    pub retries: u32,
    pub backoff: Duration,
    /// Upper bound on concurrent store calls. Keep it below the pool size.
    pub max_concurrent: usize,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(2000),
            retries: 1,
            backoff: Duration::from_millis(100),
            max_concurrent: 8,
        }
    }
}

#[derive(Clone)]
pub struct ProfileFetcher {
    store: Arc<dyn ProfileStore>,
    policy: FetchPolicy,
    permits: Arc<Semaphore>,
}

impl ProfileFetcher {
    pub fn new(store: Arc<dyn ProfileStore>, policy: FetchPolicy) -> Self {
        Self {
            store,
            permits: Arc::new(Semaphore::new(policy.max_concurrent.max(1))),
            policy,
        }
    }

    pub async fn fetch_candidate(&self, id: &str) -> Result<CandidateProfile, MatchError> {
        self.with_retry(format!("candidate '{id}'"), || self.store.fetch_candidate(id))
            .await?
            .ok_or_else(|| MatchError::candidate_not_found(id))
    }

    pub async fn fetch_job(&self, id: &str) -> Result<JobPosting, MatchError> {
        self.with_retry(format!("job '{id}'"), || self.store.fetch_job(id))
            .await?
            .ok_or_else(|| MatchError::job_not_found(id))
    }

    /// Fetches both profiles concurrently; the first failure aborts the pair.
    pub async fn fetch_pair(
        &self,
        candidate_id: &str,
        job_id: &str,
    ) -> Result<(CandidateProfile, JobPosting), MatchError> {
        tokio::try_join!(self.fetch_candidate(candidate_id), self.fetch_job(job_id))
    }

    pub async fn list_open_job_ids(&self) -> Result<Vec<String>, MatchError> {
        self.with_retry("open jobs".to_string(), || self.store.list_open_job_ids())
            .await
    }

    pub async fn list_candidate_ids(&self) -> Result<Vec<String>, MatchError> {
        self.with_retry("candidates".to_string(), || {
            self.store.list_candidate_ids()
        })
        .await
    }

    async fn with_retry<T, F, Fut>(&self, what: String, op: F) -> Result<T, MatchError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let attempts = self.policy.retries + 1;

        for attempt in 0..attempts {
            if attempt > 0 {
                tokio::time::sleep(self.policy.backoff).await;
            }

            // `permits` is never closed
            let _permit = self.permits.acquire().await.ok();
            match tokio::time::timeout(self.policy.timeout, op()).await {
                Ok(result) => return result.map_err(MatchError::from),
                Err(_) => {
                    warn!(
                        "Fetching {what} timed out after {}ms (attempt {}/{attempts})",
                        self.policy.timeout.as_millis(),
                        attempt + 1
                    );
                }
            }
        }

        Err(MatchError::RetrievalTimeout { what, attempts })
    }
}
