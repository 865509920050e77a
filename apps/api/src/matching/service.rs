//! Match Service: orchestrates fetch → score → aggregate → report.
//!
//! Constructed once at startup with its collaborators and carried in `AppState`
//! as `Arc<MatchService>`. Scoring itself touches no shared mutable state; the
//! only async work is profile retrieval, persistence and the result cache.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::matching::aggregator::Aggregator;
use crate::matching::cache::ResultCache;
use crate::matching::error::MatchError;
use crate::matching::fetcher::{FetchPolicy, ProfileFetcher};
use crate::matching::reporter::{MatchResult, ResultReporter};
use crate::matching::scorer::FeatureScorer;
use crate::matching::weights::MatchWeights;
use crate::models::candidate::CandidateProfile;
use crate::models::job::JobPosting;
use crate::store::ProfileStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ScoreOptions {
    /// Append the result to the audit trail.
    #[serde(default)]
    pub persist: bool,
    /// Skip the result cache and recompute.
    #[serde(default)]
    pub fresh: bool,
}

/// One item of a batch that could not be scored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankFailure {
    pub id: String,
    pub code: &'static str,
    pub message: String,
}

/// Batch outcome: best matches first, plus per-item failures.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub subject_id: String,
    pub evaluated: usize,
    pub matches: Vec<MatchResult>,
    pub failures: Vec<RankFailure>,
}

pub struct MatchService {
    store: Arc<dyn ProfileStore>,
    fetcher: ProfileFetcher,
    scorer: Arc<dyn FeatureScorer>,
    aggregator: Aggregator,
    reporter: ResultReporter,
    cache: Option<Arc<dyn ResultCache>>,
}

impl MatchService {
    /// Fails with `MatchError::Configuration` when `weights` are invalid.
    pub fn new(
        store: Arc<dyn ProfileStore>,
        scorer: Arc<dyn FeatureScorer>,
        weights: MatchWeights,
        policy: FetchPolicy,
        cache: Option<Arc<dyn ResultCache>>,
    ) -> Result<Self, MatchError> {
        Ok(Self {
            fetcher: ProfileFetcher::new(store.clone(), policy),
            reporter: ResultReporter::new(store.clone()),
            aggregator: Aggregator::new(weights)?,
            store,
            scorer,
            cache,
        })
    }

    pub fn weights(&self) -> &MatchWeights {
        self.aggregator.weights()
    }

    pub fn store_backend(&self) -> &'static str {
        self.store.backend()
    }

    pub fn cache_backend(&self) -> Option<&'static str> {
        self.cache.as_ref().map(|c| c.backend())
    }

    pub fn scorer_backend(&self) -> &'static str {
        self.scorer.backend()
    }

    /// Pure scoring of two already-fetched profiles. Identical inputs yield identical output.
    pub fn compute(
        &self,
        candidate: &CandidateProfile,
        job: &JobPosting,
        computed_at: DateTime<Utc>,
    ) -> Result<MatchResult, MatchError> {
        let dimensions = self.scorer.score(candidate, job);
        let aggregate = self.aggregator.aggregate(&dimensions)?;
        Ok(ResultReporter::package(
            &candidate.id,
            &job.id,
            dimensions,
            aggregate,
            computed_at,
        ))
    }

    /// Scores one (candidate, job) pair end to end.
    pub async fn score(
        &self,
        candidate_id: &str,
        job_id: &str,
        options: ScoreOptions,
    ) -> Result<MatchResult, MatchError> {
        if !options.fresh && !options.persist {
            if let Some(cached) = self.cached(candidate_id, job_id).await {
                debug!("Cache hit for {candidate_id}/{job_id}");
                return Ok(cached);
            }
        }

        let (candidate, job) = self.fetcher.fetch_pair(candidate_id, job_id).await?;
        let result = self.compute(&candidate, &job, now())?;

        if options.persist {
            self.reporter.persist(&result).await?;
        }
        if let Some(cache) = &self.cache {
            cache.put(&result).await;
        }

        info!(
            "Scored candidate {candidate_id} against job {job_id}: {}",
            result.score
        );
        Ok(result)
    }

    async fn cached(&self, candidate_id: &str, job_id: &str) -> Option<MatchResult> {
        let hit = self.cache.as_ref()?.get(candidate_id, job_id).await?;
        if hit.candidate_id != candidate_id || hit.job_id != job_id {
            warn!(
                "Ignoring cached result for {}/{} returned for {candidate_id}/{job_id}",
                hit.candidate_id, hit.job_id
            );
            return None;
        }
        Some(hit)
    }

    pub async fn history(
        &self,
        candidate_id: &str,
        job_id: &str,
    ) -> Result<Vec<MatchResult>, MatchError> {
        self.reporter.history(candidate_id, job_id).await
    }

    pub async fn invalidate(&self, candidate_id: &str, job_id: &str) {
        if let Some(cache) = &self.cache {
            cache.invalidate(candidate_id, job_id).await;
        }
    }

    /// Scores one candidate against every open job concurrently.
    ///
    /// The candidate must exist; a job that fails to load is reported in
    /// `failures` without affecting the others.
    pub async fn rank_jobs_for_candidate(
        self: &Arc<Self>,
        candidate_id: &str,
        limit: usize,
    ) -> Result<Ranking, MatchError> {
        let candidate = Arc::new(self.fetcher.fetch_candidate(candidate_id).await?);
        let job_ids = self.fetcher.list_open_job_ids().await?;
        let computed_at = now();

        let mut tasks = JoinSet::new();
        for job_id in job_ids {
            let service = Arc::clone(self);
            let candidate = Arc::clone(&candidate);
            tasks.spawn(async move {
                let outcome = match service.fetcher.fetch_job(&job_id).await {
                    Ok(job) => service.compute(&candidate, &job, computed_at),
                    Err(e) => Err(e),
                };
                (job_id, outcome)
            });
        }

        let ranking = collect_ranking(candidate_id, tasks, limit).await;
        info!(
            "Ranked {} open jobs for candidate {candidate_id} ({} failed)",
            ranking.evaluated,
            ranking.failures.len()
        );
        Ok(ranking)
    }

    /// Scores every candidate against one job concurrently.
    pub async fn rank_candidates_for_job(
        self: &Arc<Self>,
        job_id: &str,
        limit: usize,
    ) -> Result<Ranking, MatchError> {
        let job = Arc::new(self.fetcher.fetch_job(job_id).await?);
        let candidate_ids = self.fetcher.list_candidate_ids().await?;
        let computed_at = now();

        let mut tasks = JoinSet::new();
        for candidate_id in candidate_ids {
            let service = Arc::clone(self);
            let job = Arc::clone(&job);
            tasks.spawn(async move {
                let outcome = match service.fetcher.fetch_candidate(&candidate_id).await {
                    Ok(candidate) => service.compute(&candidate, &job, computed_at),
                    Err(e) => Err(e),
                };
                (candidate_id, outcome)
            });
        }

        let ranking = collect_ranking(job_id, tasks, limit).await;
        info!(
            "Ranked {} candidates for job {job_id} ({} failed)",
            ranking.evaluated,
            ranking.failures.len()
        );
        Ok(ranking)
    }
}

/// Current time at the precision the result store keeps (microseconds).
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Drains a batch, keeping the `limit` best results (score desc, then ids asc).
async fn collect_ranking(
    subject_id: &str,
    mut tasks: JoinSet<(String, Result<MatchResult, MatchError>)>,
    limit: usize,
) -> Ranking {
    let mut matches = Vec::new();
    let mut failures = Vec::new();
    let mut evaluated = 0;

    while let Some(joined) = tasks.join_next().await {
        evaluated += 1;
        match joined {
            Ok((_, Ok(result))) => matches.push(result),
            Ok((id, Err(e))) => {
                warn!("Skipping {id} while ranking for {subject_id}: {e}");
                failures.push(RankFailure {
                    id,
                    code: e.code(),
                    message: e.to_string(),
                });
            }
            Err(e) => {
                error!("Ranking task for {subject_id} aborted: {e}");
                failures.push(RankFailure {
                    id: String::new(),
                    code: "TASK_FAILED",
                    message: e.to_string(),
                });
            }
        }
    }

    matches.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.job_id.cmp(&b.job_id))
            .then_with(|| a.candidate_id.cmp(&b.candidate_id))
    });
    matches.truncate(limit);
    failures.sort_by(|a, b| a.id.cmp(&b.id));

    Ranking {
        subject_id: subject_id.to_string(),
        evaluated,
        matches,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::time::Duration;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::TimeZone;
    use tokio::sync::Semaphore;

    use crate::matching::cache::MemoryResultCache;
    use crate::matching::scorer::{Dimension, RuleBasedScorer};
    use crate::store::MemoryProfileStore;

    fn example_weights() -> MatchWeights {
        MatchWeights::new(BTreeMap::from([
            (Dimension::Skill, 0.5),
            (Dimension::Experience, 0.3),
            (Dimension::Location, 0.1),
            (Dimension::Language, 0.1),
        ]))
        .unwrap()
    }

    async fn seeded_store() -> Arc<MemoryProfileStore> {
        let store = MemoryProfileStore::new();
        store
            .insert_candidate(
                serde_json::from_str(
                    r#"{"id": "c-welder", "skills": ["welding", "forklift"], "experience_level": "expert",
                        "preferred_location": {"country": "Romania"}, "willing_to_relocate": true,
                        "languages": ["romanian", "english"]}"#,
                )
                .unwrap(),
            )
            .await;
        store
            .insert_candidate(
                serde_json::from_str(r#"{"id": "c-new", "skills": ["pruning"]}"#).unwrap(),
            )
            .await;
        store
            .insert_job(
                serde_json::from_str(r#"{"id": "j-weld", "required_skills": ["welding"]}"#)
                    .unwrap(),
            )
            .await;
        store
            .insert_job(
                serde_json::from_str(
                    r#"{"id": "j-forest", "required_skills": ["chainsaw", "pruning"],
                        "min_experience": "intermediate", "language_requirement": "danish",
                        "location": {"city": "Silkeborg", "country": "Denmark"}}"#,
                )
                .unwrap(),
            )
            .await;
        store
            .insert_job(
                serde_json::from_str(
                    r#"{"id": "j-closed", "required_skills": ["welding"], "is_open": false}"#,
                )
                .unwrap(),
            )
            .await;
        Arc::new(store)
    }

    fn make_service(
        store: Arc<MemoryProfileStore>,
        cache: Option<Arc<dyn ResultCache>>,
    ) -> Arc<MatchService> {
        Arc::new(
            MatchService::new(
                store,
                Arc::new(RuleBasedScorer),
                example_weights(),
                FetchPolicy::default(),
                cache,
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_example_pair_scores_weighted_sum() {
        let service = make_service(seeded_store().await, None);
        let result = service
            .score("c-welder", "j-weld", ScoreOptions::default())
            .await
            .unwrap();

        // skill 1.0, everything else unknown on the job side → 0.5
        assert_eq!(result.dimensions[&Dimension::Skill], 1.0);
        assert_eq!(result.dimensions[&Dimension::Language], 0.5);
        assert_eq!(result.score, 75.0);
        assert!(result.rationale.contains("skill"));
    }

    #[tokio::test]
    async fn test_compute_is_idempotent() {
        let store = seeded_store().await;
        let service = make_service(store.clone(), None);
        let candidate = store.fetch_candidate("c-welder").await.unwrap().unwrap();
        let job = store.fetch_job("j-forest").await.unwrap().unwrap();
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

        let first = service.compute(&candidate, &job, at).unwrap();
        let second = service.compute(&candidate, &job, at).unwrap();
        assert_eq!(first, second);
        assert!((0.0..=100.0).contains(&first.score));
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let service = make_service(seeded_store().await, None);
        let err = service
            .score("c-ghost", "j-weld", ScoreOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MatchError::NotFound { .. }));
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_invalid_weights_rejected_at_construction() {
        let weights: MatchWeights = serde_json::from_str(r#"{"skill": 0.2}"#).unwrap();
        let result = MatchService::new(
            Arc::new(MemoryProfileStore::new()),
            Arc::new(RuleBasedScorer),
            weights,
            FetchPolicy::default(),
            None,
        );
        assert!(matches!(result, Err(MatchError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_persist_appends_to_history() {
        let service = make_service(seeded_store().await, None);
        let persist = ScoreOptions {
            persist: true,
            fresh: false,
        };
        service.score("c-welder", "j-weld", persist).await.unwrap();
        service.score("c-welder", "j-weld", persist).await.unwrap();
        service
            .score("c-welder", "j-weld", ScoreOptions::default())
            .await
            .unwrap();

        let history = service.history("c-welder", "j-weld").await.unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_cached_result_is_reused_until_invalidated() {
        let cache: Arc<dyn ResultCache> = Arc::new(MemoryResultCache::new(Duration::from_secs(300)));
        let service = make_service(seeded_store().await, Some(cache));

        let first = service
            .score("c-welder", "j-weld", ScoreOptions::default())
            .await
            .unwrap();
        let cached = service
            .score("c-welder", "j-weld", ScoreOptions::default())
            .await
            .unwrap();
        assert_eq!(first.computed_at, cached.computed_at);

        service.invalidate("c-welder", "j-weld").await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let recomputed = service
            .score("c-welder", "j-weld", ScoreOptions::default())
            .await
            .unwrap();
        assert!(recomputed.computed_at > first.computed_at);
        assert_eq!(recomputed.score, first.score);
    }

    #[tokio::test]
    async fn test_rank_jobs_for_candidate_orders_by_score() {
        let service = make_service(seeded_store().await, None);
        let ranking = service.rank_jobs_for_candidate("c-welder", 10).await.unwrap();

        assert_eq!(ranking.evaluated, 2, "closed postings are not ranked");
        assert!(ranking.failures.is_empty());
        let ids: Vec<&str> = ranking.matches.iter().map(|m| m.job_id.as_str()).collect();
        assert_eq!(ids, vec!["j-weld", "j-forest"]);
        assert!(ranking.matches[0].score >= ranking.matches[1].score);
    }

    #[tokio::test]
    async fn test_rank_respects_limit() {
        let service = make_service(seeded_store().await, None);
        let ranking = service.rank_jobs_for_candidate("c-welder", 1).await.unwrap();
        assert_eq!(ranking.matches.len(), 1);
        assert_eq!(ranking.evaluated, 2);
    }

    #[tokio::test]
    async fn test_rank_candidates_for_job() {
        let service = make_service(seeded_store().await, None);
        let ranking = service.rank_candidates_for_job("j-forest", 10).await.unwrap();
        assert_eq!(ranking.subject_id, "j-forest");
        assert_eq!(ranking.matches.len(), 2);
    }

    /// Lists a posting that disappears before it can be fetched.
    struct VanishingJobStore(Arc<MemoryProfileStore>);

    #[async_trait]
    impl ProfileStore for VanishingJobStore {
        async fn fetch_candidate(
            &self,
            id: &str,
        ) -> Result<Option<CandidateProfile>, crate::store::StoreError> {
            self.0.fetch_candidate(id).await
        }

        async fn fetch_job(&self, id: &str) -> Result<Option<JobPosting>, crate::store::StoreError> {
            self.0.fetch_job(id).await
        }

        async fn persist_result(&self, result: &MatchResult) -> Result<(), crate::store::StoreError> {
            self.0.persist_result(result).await
        }

        async fn result_history(
            &self,
            candidate_id: &str,
            job_id: &str,
        ) -> Result<Vec<MatchResult>, crate::store::StoreError> {
            self.0.result_history(candidate_id, job_id).await
        }

        async fn list_open_job_ids(&self) -> Result<Vec<String>, crate::store::StoreError> {
            let mut ids = self.0.list_open_job_ids().await?;
            ids.push("j-vanished".to_string());
            Ok(ids)
        }

        async fn list_candidate_ids(&self) -> Result<Vec<String>, crate::store::StoreError> {
            self.0.list_candidate_ids().await
        }

        fn backend(&self) -> &'static str {
            "vanishing"
        }
    }

    #[tokio::test]
    async fn test_rank_isolates_failed_items() {
        let store = Arc::new(VanishingJobStore(seeded_store().await));
        let service = Arc::new(
            MatchService::new(
                store,
                Arc::new(RuleBasedScorer),
                example_weights(),
                FetchPolicy::default(),
                None,
            )
            .unwrap(),
        );

        let ranking = service.rank_jobs_for_candidate("c-welder", 10).await.unwrap();
        assert_eq!(ranking.evaluated, 3);
        assert_eq!(ranking.matches.len(), 2);
        assert_eq!(ranking.failures.len(), 1);
        assert_eq!(ranking.failures[0].id, "j-vanished");
        assert_eq!(ranking.failures[0].code, "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_rank_for_unknown_candidate_fails_as_unit() {
        let service = make_service(seeded_store().await, None);
        let err = service
            .rank_jobs_for_candidate("c-ghost", 10)
            .await
            .unwrap_err();
        assert!(matches!(err, MatchError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_score_truncates_timestamp_to_microseconds() {
        let service = make_service(seeded_store().await, None);
        let persist = ScoreOptions {
            persist: true,
            fresh: false,
        };
        let live = service.score("c-welder", "j-weld", persist).await.unwrap();
        assert_eq!(live.computed_at.timestamp_subsec_nanos() % 1_000, 0);

        let history = service.history("c-welder", "j-weld").await.unwrap();
        assert_eq!(history[0].computed_at, live.computed_at);
    }

    /// Returns a result for a different pair whatever is asked for.
    struct MisroutedCache;

    #[async_trait]
    impl ResultCache for MisroutedCache {
        async fn get(&self, _candidate_id: &str, _job_id: &str) -> Option<MatchResult> {
            Some(MatchResult {
                candidate_id: "c:1".to_string(),
                job_id: "j".to_string(),
                score: 99.9,
                dimensions: Default::default(),
                rationale: "other pair".to_string(),
                computed_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            })
        }

        async fn put(&self, _result: &MatchResult) {}

        async fn invalidate(&self, _candidate_id: &str, _job_id: &str) {}

        fn backend(&self) -> &'static str {
            "misrouted"
        }
    }

    #[tokio::test]
    async fn test_cached_result_for_another_pair_is_ignored() {
        let cache: Arc<dyn ResultCache> = Arc::new(MisroutedCache);
        let service = make_service(seeded_store().await, Some(cache));
        let result = service
            .score("c-welder", "j-weld", ScoreOptions::default())
            .await
            .unwrap();
        assert_eq!(result.candidate_id, "c-welder");
        assert_eq!(result.job_id, "j-weld");
        assert_eq!(result.score, 75.0);
    }

    const POOL_SIZE: usize = 10;

    /// Serves at most `POOL_SIZE` job queries at once, 300ms each; further
    /// queries queue for a connection the way a sqlx pool does.
    struct PooledStore {
        inner: MemoryProfileStore,
        connections: Semaphore,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl ProfileStore for PooledStore {
        async fn fetch_candidate(
            &self,
            id: &str,
        ) -> Result<Option<CandidateProfile>, crate::store::StoreError> {
            self.inner.fetch_candidate(id).await
        }

        async fn fetch_job(&self, id: &str) -> Result<Option<JobPosting>, crate::store::StoreError> {
            let _connection = self.connections.acquire().await.unwrap();
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(running, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(300)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.inner.fetch_job(id).await
        }

        async fn persist_result(&self, result: &MatchResult) -> Result<(), crate::store::StoreError> {
            self.inner.persist_result(result).await
        }

        async fn result_history(
            &self,
            candidate_id: &str,
            job_id: &str,
        ) -> Result<Vec<MatchResult>, crate::store::StoreError> {
            self.inner.result_history(candidate_id, job_id).await
        }

        async fn list_open_job_ids(&self) -> Result<Vec<String>, crate::store::StoreError> {
            self.inner.list_open_job_ids().await
        }

        async fn list_candidate_ids(&self) -> Result<Vec<String>, crate::store::StoreError> {
            self.inner.list_candidate_ids().await
        }

        fn backend(&self) -> &'static str {
            "pooled"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_large_batch_does_not_time_out_on_a_busy_pool() {
        let inner = MemoryProfileStore::new();
        inner
            .insert_candidate(
                serde_json::from_str(r#"{"id": "c-welder", "skills": ["welding"]}"#).unwrap(),
            )
            .await;
        for n in 0..200 {
            inner
                .insert_job(
                    serde_json::from_value(serde_json::json!({
                        "id": format!("j-{n:03}"),
                        "required_skills": ["welding"]
                    }))
                    .unwrap(),
                )
                .await;
        }
        let store = Arc::new(PooledStore {
            inner,
            connections: Semaphore::new(POOL_SIZE),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let service = Arc::new(
            MatchService::new(
                store.clone(),
                Arc::new(RuleBasedScorer),
                example_weights(),
                FetchPolicy::default(),
                None,
            )
            .unwrap(),
        );

        let ranking = service.rank_jobs_for_candidate("c-welder", 20).await.unwrap();

        assert_eq!(ranking.evaluated, 200);
        assert!(ranking.failures.is_empty(), "{:?}", ranking.failures.first());
        assert_eq!(ranking.matches.len(), 20);
        assert!(store.peak.load(Ordering::SeqCst) <= FetchPolicy::default().max_concurrent);
    }
}
