use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::matching::fetcher::FetchPolicy;
use crate::matching::weights::MatchWeights;

/// Application configuration loaded from environment variables.
/// Fails at startup on malformed values, including invalid match weights.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absent → in-memory store (optionally seeded from `seed_file`).
    pub database_url: Option<String>,
    /// Absent → in-process result cache.
    pub redis_url: Option<String>,
    pub seed_file: Option<PathBuf>,
    pub port: u16,
    pub rust_log: String,
    pub weights: MatchWeights,
    pub fetch_policy: FetchPolicy,
    /// Zero disables the result cache.
    pub cache_ttl: Duration,
    pub rank_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let weights = match optional("MATCH_WEIGHTS") {
            Some(raw) => MatchWeights::from_json(&raw).context("MATCH_WEIGHTS is invalid")?,
            None => MatchWeights::default(),
        };

        let max_concurrent = parse_or("FETCH_CONCURRENCY", optional("FETCH_CONCURRENCY"), 8)?;
        if max_concurrent == 0 {
            anyhow::bail!("FETCH_CONCURRENCY must be at least 1");
        }

        Ok(Config {
            database_url: optional("DATABASE_URL"),
            redis_url: optional("REDIS_URL"),
            seed_file: optional("SEED_FILE").map(PathBuf::from),
            port: parse_or("PORT", optional("PORT"), 8080)?,
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            weights,
            fetch_policy: FetchPolicy {
                timeout: Duration::from_millis(parse_or(
                    "FETCH_TIMEOUT_MS",
                    optional("FETCH_TIMEOUT_MS"),
                    2000,
                )?),
                retries: parse_or("FETCH_RETRIES", optional("FETCH_RETRIES"), 1)?,
                backoff: Duration::from_millis(parse_or(
                    "FETCH_RETRY_BACKOFF_MS",
                    optional("FETCH_RETRY_BACKOFF_MS"),
                    100,
                )?),
                max_concurrent,
            },
            cache_ttl: Duration::from_secs(parse_or(
                "MATCH_CACHE_TTL_SECS",
                optional("MATCH_CACHE_TTL_SECS"),
                300,
            )?),
            rank_limit: parse_or("RANK_LIMIT", optional("RANK_LIMIT"), 20)?,
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{value}'")),
        None => Ok(default),
    }
}
