//! Freshness-window cache for match results, keyed by (candidate id, job id).
//!
//! The cache is best-effort: backend failures are logged and treated as misses.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::warn;

use crate::matching::reporter::MatchResult;

#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, candidate_id: &str, job_id: &str) -> Option<MatchResult>;

    async fn put(&self, result: &MatchResult);

    async fn invalidate(&self, candidate_id: &str, job_id: &str);

    fn backend(&self) -> &'static str;
}

type PairKey = (String, String);

pub struct MemoryResultCache {
    ttl: Duration,
    entries: RwLock<HashMap<PairKey, (Instant, MatchResult)>>,
}

impl MemoryResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ResultCache for MemoryResultCache {
    async fn get(&self, candidate_id: &str, job_id: &str) -> Option<MatchResult> {
        let key = (candidate_id.to_string(), job_id.to_string());
        let entries = self.entries.read().await;
        entries
            .get(&key)
            .filter(|(stored_at, _)| stored_at.elapsed() < self.ttl)
            .map(|(_, result)| result.clone())
    }

    async fn put(&self, result: &MatchResult) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, (stored_at, _)| stored_at.elapsed() < self.ttl);
        entries.insert(
            (result.candidate_id.clone(), result.job_id.clone()),
            (Instant::now(), result.clone()),
        );
    }

    async fn invalidate(&self, candidate_id: &str, job_id: &str) {
        self.entries
            .write()
            .await
            .remove(&(candidate_id.to_string(), job_id.to_string()));
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Redis-backed cache; entries expire server-side via `SET .. EX`.
pub struct RedisResultCache {
    client: redis::Client,
    ttl_secs: u64,
}

impl RedisResultCache {
    pub fn new(client: redis::Client, ttl: Duration) -> Self {
        Self {
            client,
            ttl_secs: ttl.as_secs().max(1),
        }
    }

    /// `match:v2:{len}:{candidate_id}:{job_id}`. The length prefix keeps ids
    /// containing `:` from colliding.
    fn key(candidate_id: &str, job_id: &str) -> String {
        format!("match:v2:{}:{candidate_id}:{job_id}", candidate_id.len())
    }

    fn decode(key: &str, raw: &str) -> Option<MatchResult> {
        match serde_json::from_str(raw) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("Discarding unreadable cache entry {key}: {e}");
                None
            }
        }
    }

    async fn read(&self, key: &str) -> redis::RedisResult<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.get(key).await
    }

    async fn write(&self, key: &str, raw: String) -> redis::RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set_ex(key, raw, self.ttl_secs).await
    }

    async fn remove(&self, key: &str) -> redis::RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.del(key).await
    }
}

#[async_trait]
impl ResultCache for RedisResultCache {
    async fn get(&self, candidate_id: &str, job_id: &str) -> Option<MatchResult> {
        let key = Self::key(candidate_id, job_id);
        match self.read(&key).await {
            Ok(Some(raw)) => Self::decode(&key, &raw),
            Ok(None) => None,
            Err(e) => {
                warn!("Redis cache read failed for {key}: {e}");
                None
            }
        }
    }

    async fn put(&self, result: &MatchResult) {
        let key = Self::key(&result.candidate_id, &result.job_id);
        let raw = match serde_json::to_string(result) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Could not serialize match result for cache: {e}");
                return;
            }
        };

        if let Err(e) = self.write(&key, raw).await {
            warn!("Redis cache write failed for {key}: {e}");
        }
    }

    async fn invalidate(&self, candidate_id: &str, job_id: &str) {
        let key = Self::key(candidate_id, job_id);
        if let Err(e) = self.remove(&key).await {
            warn!("Redis cache invalidation failed for {key}: {e}");
        }
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
