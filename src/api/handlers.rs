//! API Request Handlers

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use std::sync::Arc;
use std::time::Instant;

use super::types::*;
use crate::core::service::QueryService;
use crate::models::{
    parse_address, AppError, AppResult, BalanceQuery, BalanceResponse, LogsQuery, LogsResponse,
};
use crate::utils::constants::{get_chain_name, APP_VERSION, DEFAULT_CHAIN_ID};

/// Shared application state
pub struct AppState {
    pub service: Arc<QueryService>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(service: Arc<QueryService>) -> Self {
        Self {
            service,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthData> {
    let registry = state.service.registry();
    let chains = registry
        .chain_ids()
        .into_iter()
        .map(|chain_id| ChainInfo {
            chain_id,
            name: get_chain_name(chain_id).to_string(),
        })
        .collect();

    Json(HealthData {
        status: if registry.is_initialized() {
            "healthy"
        } else {
            "starting"
        }
        .to_string(),
        version: APP_VERSION.to_string(),
        uptime_seconds: state.uptime_seconds(),
        chains,
        max_block_range: state.service.max_block_range(),
        cache: state.service.cache().stats(),
        timestamp: chrono::Utc::now().timestamp(),
    })
}

// ============================================
// Balance by block
// ============================================

/// GET /block/:block_number/balance/:address?chain_id=
pub async fn balance_by_block(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(u64, String)>, PathRejection>,
    params: Result<Query<BalanceParams>, QueryRejection>,
) -> AppResult<Json<BalanceResponse>> {
    let Path((block_number, raw_address)) =
        path.map_err(|e| AppError::validation(e.body_text()))?;
    let Query(params) = params.map_err(|e| AppError::validation(e.body_text()))?;

    let chain_id = params.chain_id.unwrap_or(DEFAULT_CHAIN_ID);
    if chain_id == 0 {
        return Err(AppError::validation("chain_id must be a positive integer"));
    }

    let query = BalanceQuery {
        chain_id,
        address: parse_address(&raw_address)?,
        block_number,
    };

    let response = state.service.balance_by_block(&query).await?;
    Ok(Json(response))
}

// ============================================
// Logs by block period
// ============================================

/// GET /logs?from_block=&to_block=
pub async fn logs_by_block_period(
    State(state): State<Arc<AppState>>,
    params: Result<Query<LogsParams>, QueryRejection>,
) -> AppResult<Json<LogsResponse>> {
    let Query(params) = params.map_err(|e| AppError::validation(e.body_text()))?;

    let query = LogsQuery::new(params.from_block, params.to_block)?;

    let response = state.service.logs_by_block_period(&query).await?;
    Ok(Json(response))
}
