//! Shared fixtures for the HTTP-level tests

#![allow(dead_code)]

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use axum::Router;
use blockscope::api::{create_router, AppState};
use blockscope::{
    AppError, AppResult, CacheAside, CacheStore, ChainClient, ChainRegistry, ClientHandle,
    LogRecord, MemoryCache, QueryService, RangeGuard,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Node stub with fixed answers and call counters
pub struct StubChain {
    pub chain_id: u64,
    pub head: u64,
    pub balance: U256,
    pub logs: Vec<LogRecord>,
    pub rpc_error: Option<String>,
    pub calls: AtomicUsize,
}

impl StubChain {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            head: 0,
            balance: U256::ZERO,
            logs: Vec::new(),
            rpc_error: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer<T>(&self, value: T) -> AppResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.rpc_error {
            Some(message) => Err(AppError::upstream(message.clone())),
            None => Ok(value),
        }
    }
}

#[async_trait]
impl ChainClient for StubChain {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn masked_url(&self) -> String {
        "stub://***HIDDEN***".to_string()
    }

    async fn block_number(&self) -> AppResult<u64> {
        self.answer(self.head)
    }

    async fn get_balance(&self, _address: Address, _block: u64) -> AppResult<U256> {
        self.answer(self.balance)
    }

    async fn get_logs(&self, _address: Address, _from: u64, _to: u64) -> AppResult<Vec<LogRecord>> {
        self.answer(self.logs.clone())
    }

    async fn close(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Cache store that is always down
pub struct DownCache;

#[async_trait]
impl CacheStore for DownCache {
    fn backend(&self) -> &'static str {
        "down"
    }

    async fn get(&self, _key: &str) -> AppResult<Option<String>> {
        Err(AppError::cache_unavailable("connection refused"))
    }

    async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> AppResult<()> {
        Err(AppError::cache_unavailable("connection refused"))
    }

    async fn delete(&self, _key: &str) -> AppResult<()> {
        Err(AppError::cache_unavailable("connection refused"))
    }
}

pub fn app_with(chains: Vec<Arc<StubChain>>, store: Arc<dyn CacheStore>) -> Router {
    let registry = ChainRegistry::from_clients(chains.into_iter().map(|c| c as ClientHandle))
        .expect("at least one chain");
    let service = QueryService::new(
        Arc::new(registry),
        Arc::new(CacheAside::new(store, Duration::from_secs(180))),
        RangeGuard::new(3000),
        Address::repeat_byte(0x66),
    );
    create_router(
        Arc::new(AppState::new(Arc::new(service))),
        &["http://localhost:8000".to_string()],
    )
}

pub fn app(chain: Arc<StubChain>) -> Router {
    app_with(vec![chain], Arc::new(MemoryCache::new()))
}

pub fn sample_log(block_number: u64) -> LogRecord {
    LogRecord {
        address: "0x6666666666666666666666666666666666666666".to_string(),
        block_hash: format!("0x{:064x}", block_number),
        block_number,
        data: "0x".to_string(),
        log_index: 0,
        removed: false,
        topics: vec![],
        transaction_hash: format!("0x{:064x}", block_number + 1),
        transaction_index: 0,
    }
}
