//! API Request/Response Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::core::cache_aside::CacheStats;
use crate::models::AppError;

/// Error body: `{"detail": "..."}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(code = self.code_str(), "❌ {}", self);
            "Internal server error".to_string()
        } else {
            if self.code.is_upstream() {
                warn!(code = self.code_str(), "⚠️ upstream: {}", self.message);
            }
            self.message
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}

// ============================================
// Query parameters
// ============================================

/// `?chain_id=` on the balance route
#[derive(Debug, Deserialize)]
pub struct BalanceParams {
    pub chain_id: Option<u64>,
}

/// `?from_block=&to_block=` on the logs route
#[derive(Debug, Deserialize)]
pub struct LogsParams {
    pub from_block: u64,
    pub to_block: Option<u64>,
}

// ============================================
// Health Check
// ============================================

#[derive(Debug, Serialize)]
pub struct ChainInfo {
    pub chain_id: u64,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub chains: Vec<ChainInfo>,
    pub max_block_range: u64,
    pub cache: CacheStats,
    pub timestamp: i64,
}
