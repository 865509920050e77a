mod admin;
mod config;
mod db;
mod errors;
mod matching;
mod models;
mod routes;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::db::create_pool;
use crate::matching::cache::{MemoryResultCache, RedisResultCache, ResultCache};
use crate::matching::scorer::RuleBasedScorer;
use crate::matching::service::MatchService;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{MemoryProfileStore, PgProfileStore, ProfileStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (invalid weights abort startup here)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Match API v{}", env!("CARGO_PKG_VERSION"));

    let store = build_store(&config).await?;
    info!("Profile store initialized (backend: {})", store.backend());

    let cache = build_cache(&config)?;
    match &cache {
        Some(cache) => info!(
            "Result cache initialized (backend: {}, ttl: {}s)",
            cache.backend(),
            config.cache_ttl.as_secs()
        ),
        None => info!("Result cache disabled"),
    }

    let matcher = MatchService::new(
        store,
        Arc::new(RuleBasedScorer),
        config.weights.clone(),
        config.fetch_policy,
        cache,
    )?;
    info!("Match weights: {:?}", matcher.weights());

    // Build app state
    let state = AppState {
        config: config.clone(),
        matcher: Arc::new(matcher),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// PostgreSQL when `DATABASE_URL` is set, otherwise an in-memory store.
async fn build_store(config: &Config) -> Result<Arc<dyn ProfileStore>> {
    if let Some(database_url) = &config.database_url {
        // Profile fetches are capped below the pool size; the rest serve persistence
        let max_connections = (config.fetch_policy.max_concurrent as u32 + 2).max(10);
        let pool = create_pool(database_url, max_connections, config.fetch_policy.timeout).await?;
        return Ok(Arc::new(PgProfileStore::new(pool)));
    }

    warn!("DATABASE_URL not set; using in-memory profile store");
    let store = match &config.seed_file {
        Some(path) => MemoryProfileStore::from_seed_file(path)?,
        None => MemoryProfileStore::new(),
    };
    Ok(Arc::new(store))
}

/// Redis when `REDIS_URL` is set, in-process otherwise; `None` when the TTL is zero.
fn build_cache(config: &Config) -> Result<Option<Arc<dyn ResultCache>>> {
    if config.cache_ttl.is_zero() {
        return Ok(None);
    }
    let cache: Arc<dyn ResultCache> = match &config.redis_url {
        Some(url) => Arc::new(RedisResultCache::new(
            redis::Client::open(url.as_str())?,
            config.cache_ttl,
        )),
        None => Arc::new(MemoryResultCache::new(config.cache_ttl)),
    };
    Ok(Some(cache))
}
