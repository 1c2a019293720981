//! Blockscope API Server
//!
//! Usage:
//!   blockscope
//!
//! Environment:
//!   AVAX_RPC / ETH_RPC  - RPC endpoints (at least one required)
//!   REDIS_URL           - Shared cache (in-process cache when unset)
//!   LOG_LEVEL           - Log level (default: INFO)
//!   PORT                - Server port (default: 8000)

use blockscope::api::{bind_listener, create_router, AppState};
use blockscope::utils::constants::{APP_NAME, APP_VERSION, CACHE_CLEANUP_INTERVAL_SECS};
use blockscope::{
    CacheAside, CacheStore, ChainRegistry, MemoryCache, QueryService, RangeGuard, RedisCache,
    Settings,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level);

    info!("🚀 {} v{} starting", APP_NAME, APP_VERSION);

    // Cache store: Redis when configured and reachable, in-process otherwise
    let store = build_cache_store(settings.redis_url.as_deref()).await;
    let cache = Arc::new(CacheAside::new(store, settings.cache_ttl));

    // One client per configured chain; zero clients aborts startup
    let registry = Arc::new(ChainRegistry::from_settings(&settings)?);
    info!("🔗 Chains ready: {:?}", registry.chain_ids());

    let service = Arc::new(QueryService::new(
        registry.clone(),
        cache.clone(),
        RangeGuard::new(settings.max_block_range),
        settings.contract_address,
    ));
    info!(
        "📜 Logs contract {} | max block range {} | cache TTL {}s",
        settings.contract_checksum(),
        settings.max_block_range,
        settings.cache_ttl.as_secs()
    );

    let state = Arc::new(AppState::new(service));
    let app = create_router(state, &settings.allowed_origins);

    let listener = bind_listener(&settings.host, settings.port).await?;

    info!("🌐 Listening on http://{}", listener.local_addr()?);
    info!("Endpoints:");
    info!("  GET /block/:block_number/balance/:address?chain_id=  - Balance at block");
    info!("  GET /logs?from_block=&to_block=                      - Contract logs");
    info!("  GET /health                                          - Health check");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🛑 Shutdown signal received, cleaning up...");
    registry.shutdown().await;

    let stats = cache.stats();
    info!(
        "📊 Cache ({}): {} hits, {} misses, {} unavailable, {} write failures",
        stats.backend, stats.hits, stats.misses, stats.unavailable, stats.write_failures
    );
    info!("👋 {} shutdown complete", APP_NAME);

    Ok(())
}

fn init_logging(level: &str) {
    // RUST_LOG wins over LOG_LEVEL
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.to_lowercase()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

async fn build_cache_store(redis_url: Option<&str>) -> Arc<dyn CacheStore> {
    if let Some(url) = redis_url {
        match RedisCache::connect(url).await {
            Ok(redis) => {
                info!("🗄️ Redis cache connected");
                return Arc::new(redis);
            }
            Err(e) => warn!("⚠️ Redis unavailable ({}), using in-memory cache", e),
        }
    } else {
        info!("🗄️ REDIS_URL not set, using in-memory cache");
    }

    let memory = MemoryCache::new();
    memory.spawn_cleanup(Duration::from_secs(CACHE_CLEANUP_INTERVAL_SECS));
    Arc::new(memory)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("⚠️ Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("⚠️ Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
