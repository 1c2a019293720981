//! RPC Client Module - JSON-RPC over HTTP
//!
//! One `RpcProvider` per chain, created at startup and shared by every
//! request for that chain.
//! 1. Gzip-enabled reqwest client with User-Agent and request timeout
//! 2. Exponential backoff with jitter for transport failures (timeouts,
//!    connection errors, HTTP 429/5xx)
//! 3. JSON-RPC error objects are returned as-is, never retried
//! 4. Endpoint credentials masked in every log line

use alloy_primitives::{Address, U256};
use alloy_rpc_types::Log;
use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, CONTENT_TYPE, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::ChainClient;
use crate::models::{hex_prefixed, AppError, AppResult, LogRecord};
use crate::utils::constants::{
    get_chain_name, RETRY_JITTER_PERCENT, RPC_BASE_RETRY_MS, RPC_MAX_RETRY_MS,
    USER_AGENT as USER_AGENT_CONST,
};

/// RPC Provider with retry logic for one chain
#[derive(Clone)]
pub struct RpcProvider {
    /// Endpoint URL (may embed an API key)
    url: String,
    /// HTTP client with custom headers (gzip enabled)
    client: reqwest::Client,
    /// Chain ID for this provider
    chain_id: u64,
    /// Network name for logging
    network_name: String,
    /// Transport retries after the first attempt; 0 disables retrying
    max_retries: u32,
    /// Monotonic JSON-RPC request id
    next_id: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

impl RpcProvider {
    /// Create a provider for `chain_id` talking to `url`
    pub fn connect(chain_id: u64, url: &str, timeout: Duration, max_retries: u32) -> AppResult<Self> {
        let parsed = url::Url::parse(url)
            .map_err(|e| AppError::invalid_config("RPC endpoint", e))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::invalid_config(
                "RPC endpoint",
                format!("unsupported scheme {}", parsed.scheme()),
            ));
        }

        Ok(Self {
            url: url.to_string(),
            client: Self::build_client(timeout)?,
            chain_id,
            network_name: get_chain_name(chain_id).to_string(),
            max_retries,
            next_id: Arc::new(AtomicU64::new(1)),
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Build HTTP client with custom headers (gzip compression)
    fn build_client(timeout: Duration) -> AppResult<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| AppError::with_source(
                crate::models::ErrorCode::ConfigInvalidValue,
                "Failed to build HTTP client",
                e,
            ))
    }

    /// Execute JSON-RPC call with transport retries
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> AppResult<T> {
        if self.closed.load(Ordering::Acquire) {
            return Err(AppError::rpc_connection_failed(format!(
                "RPC client for {} is closed",
                self.network_name
            )));
        }

        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
        });

        let mut attempt = 0;
        loop {
            match self.execute_call::<T>(&payload).await {
                Ok(result) => return Ok(result),
                Err(e) if e.code.is_retryable() && attempt < self.max_retries => {
                    let delay = backoff_delay(attempt);
                    warn!(
                        chain = %self.network_name,
                        method,
                        attempt = attempt + 1,
                        max = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "⏳ RPC transport error, retrying: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Execute single RPC call
    async fn execute_call<T: DeserializeOwned>(&self, payload: &serde_json::Value) -> AppResult<T> {
        let response = self.client.post(&self.url).json(payload).send().await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(AppError::rpc_rate_limited());
        }
        if status.is_server_error() {
            return Err(AppError::rpc_connection_failed(format!("HTTP error: {}", status)));
        }
        if !status.is_success() {
            return Err(AppError::upstream(format!("HTTP error: {}", status)));
        }

        let json: RpcResponse<T> = response.json().await?;

        if let Some(error) = json.error {
            debug!(chain = %self.network_name, code = error.code, "RPC error response");
            return Err(AppError::upstream(error.message));
        }

        json.result
            .ok_or_else(|| AppError::rpc_invalid_response("No result in response"))
    }

    /// Get RPC URL (masked for logging)
    pub fn masked_url(&self) -> String {
        mask_url(&self.url)
    }
}

#[async_trait]
impl ChainClient for RpcProvider {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn masked_url(&self) -> String {
        RpcProvider::masked_url(self)
    }

    async fn block_number(&self) -> AppResult<u64> {
        let raw: String = self.call("eth_blockNumber", serde_json::json!([])).await?;
        parse_quantity_u64(&raw)
    }

    async fn get_balance(&self, address: Address, block_number: u64) -> AppResult<U256> {
        let params = serde_json::json!([address.to_checksum(None), format!("0x{:x}", block_number)]);
        let raw: String = self.call("eth_getBalance", params).await?;
        parse_quantity_u256(&raw)
    }

    async fn get_logs(
        &self,
        address: Address,
        from_block: u64,
        to_block: u64,
    ) -> AppResult<Vec<LogRecord>> {
        let params = serde_json::json!([{
            "address": address.to_checksum(None),
            "fromBlock": format!("0x{:x}", from_block),
            "toBlock": format!("0x{:x}", to_block),
        }]);
        let logs: Vec<Log> = self.call("eth_getLogs", params).await?;
        Ok(logs.into_iter().map(into_log_record).collect())
    }

    async fn close(&self) -> AppResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(AppError::rpc_connection_failed(format!(
                "RPC client for {} already closed",
                self.network_name
            )));
        }
        Ok(())
    }
}

/// JSON-RPC response structure
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

/// JSON-RPC error structure
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// Exponential backoff (base doubling, capped) with ±jitter
fn backoff_delay(attempt: u32) -> Duration {
    let base_delay = RPC_BASE_RETRY_MS.saturating_mul(2_u64.saturating_pow(attempt));
    let capped_delay = base_delay.min(RPC_MAX_RETRY_MS);

    let jitter_range = (capped_delay * RETRY_JITTER_PERCENT) / 100;
    let jitter: i64 = rand::thread_rng().gen_range(-(jitter_range as i64)..=(jitter_range as i64));
    Duration::from_millis((capped_delay as i64 + jitter).max(50) as u64)
}

/// Hide everything after the host: provider keys live in the path or query
fn mask_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or_default();
            let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();
            let hidden = parsed.path() != "/" || parsed.query().is_some();
            format!(
                "{}://{}{}{}",
                parsed.scheme(),
                host,
                port,
                if hidden { "/***HIDDEN***" } else { "" }
            )
        }
        Err(_) => "***INVALID URL***".to_string(),
    }
}

fn parse_quantity_u64(raw: &str) -> AppResult<u64> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    u64::from_str_radix(if digits.is_empty() { "0" } else { digits }, 16)
        .map_err(|_| AppError::rpc_invalid_response(format!("Invalid quantity: {}", raw)))
}

fn parse_quantity_u256(raw: &str) -> AppResult<U256> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    U256::from_str_radix(if digits.is_empty() { "0" } else { digits }, 16)
        .map_err(|_| AppError::rpc_invalid_response(format!("Invalid quantity: {}", raw)))
}

/// Provider log -> immutable record. Pending logs carry no block fields;
/// those default to zero values.
fn into_log_record(log: Log) -> LogRecord {
    LogRecord {
        address: log.inner.address.to_checksum(None),
        block_hash: hex_prefixed(log.block_hash.unwrap_or_default()),
        block_number: log.block_number.unwrap_or_default(),
        data: hex_prefixed(&log.inner.data.data),
        log_index: log.log_index.unwrap_or_default(),
        removed: log.removed,
        topics: log.inner.data.topics().iter().map(hex_prefixed).collect(),
        transaction_hash: hex_prefixed(log.transaction_hash.unwrap_or_default()),
        transaction_index: log.transaction_index.unwrap_or_default(),
    }
}
