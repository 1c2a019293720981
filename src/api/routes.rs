//! API Route Configuration

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use super::handlers::{self, AppState};
use super::middleware::{logging_middleware, request_id_middleware};
use crate::models::{AppError, AppResult};
use crate::utils::constants::MAX_CONCURRENT_REQUESTS;

/// Create the API router with all routes and middleware
pub fn create_router(state: Arc<AppState>, allowed_origins: &[String]) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allow_origin(allowed_origins))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        // Both spellings are served and share cache entries
        .route(
            "/block/:block_number/balance/:address",
            get(handlers::balance_by_block),
        )
        .route(
            "/block/:block_number/balance/:address/",
            get(handlers::balance_by_block),
        )
        .route("/logs", get(handlers::logs_by_block_period))
        .route("/logs/", get(handlers::logs_by_block_period))
        .with_state(state)
        // Middleware (order matters - bottom runs first)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
}

/// Bind the HTTP listener. `host` may be a name (`localhost`), an IPv4 or
/// an IPv6 literal.
pub async fn bind_listener(host: &str, port: u16) -> AppResult<TcpListener> {
    TcpListener::bind((host, port))
        .await
        .map_err(|e| AppError::invalid_config("BLOCKSCOPE_HOST", format!("{}:{} ({})", host, port, e)))
}

fn allow_origin(origins: &[String]) -> AllowOrigin {
    if origins.iter().any(|o| o == "*") {
        return AllowOrigin::from(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("⚠️ Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    AllowOrigin::list(parsed)
}
