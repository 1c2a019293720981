//! Test doubles shared by the core unit tests

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::models::{AppError, AppResult, LogRecord};
use crate::providers::ChainClient;
use crate::utils::cache::CacheStore;

/// Scripted chain client that counts calls
pub struct MockChainClient {
    chain_id: u64,
    head: u64,
    balance: U256,
    logs: Vec<LogRecord>,
    upstream_error: Option<String>,
    close_fails: bool,
    pub head_calls: AtomicUsize,
    pub balance_calls: AtomicUsize,
    pub logs_calls: AtomicUsize,
    close_calls: AtomicUsize,
    pub last_logs_range: Mutex<Option<(u64, u64)>>,
}

impl MockChainClient {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            head: 0,
            balance: U256::ZERO,
            logs: Vec::new(),
            upstream_error: None,
            close_fails: false,
            head_calls: AtomicUsize::new(0),
            balance_calls: AtomicUsize::new(0),
            logs_calls: AtomicUsize::new(0),
            close_calls: AtomicUsize::new(0),
            last_logs_range: Mutex::new(None),
        }
    }

    pub fn with_head(mut self, head: u64) -> Self {
        self.head = head;
        self
    }

    pub fn with_balance(mut self, balance: U256) -> Self {
        self.balance = balance;
        self
    }

    pub fn with_logs(mut self, logs: Vec<LogRecord>) -> Self {
        self.logs = logs;
        self
    }

    pub fn with_upstream_error(mut self, message: &str) -> Self {
        self.upstream_error = Some(message.to_string());
        self
    }

    pub fn with_close_failure(mut self) -> Self {
        self.close_fails = true;
        self
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    pub fn upstream_calls(&self) -> usize {
        self.head_calls.load(Ordering::SeqCst)
            + self.balance_calls.load(Ordering::SeqCst)
            + self.logs_calls.load(Ordering::SeqCst)
    }

    fn fail_if_scripted(&self) -> AppResult<()> {
        match &self.upstream_error {
            Some(message) => Err(AppError::upstream(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn masked_url(&self) -> String {
        format!("mock://{}", self.chain_id)
    }

    async fn block_number(&self) -> AppResult<u64> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.head)
    }

    async fn get_balance(&self, _address: Address, _block_number: u64) -> AppResult<U256> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        self.fail_if_scripted()?;
        Ok(self.balance)
    }

    async fn get_logs(
        &self,
        _address: Address,
        from_block: u64,
        to_block: u64,
    ) -> AppResult<Vec<LogRecord>> {
        self.logs_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut range) = self.last_logs_range.lock() {
            *range = Some((from_block, to_block));
        }
        self.fail_if_scripted()?;
        Ok(self.logs.clone())
    }

    async fn close(&self) -> AppResult<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        if self.close_fails {
            return Err(AppError::rpc_connection_failed("close failed"));
        }
        Ok(())
    }
}

/// Store whose every operation fails
#[derive(Default)]
pub struct BrokenCache {
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
}

#[async_trait]
impl CacheStore for BrokenCache {
    fn backend(&self) -> &'static str {
        "broken"
    }

    async fn get(&self, _key: &str) -> AppResult<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Err(AppError::cache_unavailable("connection refused"))
    }

    async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> AppResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        Err(AppError::cache_unavailable("connection refused"))
    }

    async fn delete(&self, _key: &str) -> AppResult<()> {
        Err(AppError::cache_unavailable("connection refused"))
    }
}

pub fn sample_log(block_number: u64, log_index: u64) -> LogRecord {
    LogRecord {
        address: "0x66357dCaCe80431aee0A7507e2E361B7e2402370".to_string(),
        block_hash: format!("0x{:064x}", block_number),
        block_number,
        data: "0x".to_string(),
        log_index,
        removed: false,
        topics: vec![format!("0x{:064x}", 0xdd)],
        transaction_hash: format!("0x{:064x}", block_number * 1000 + log_index),
        transaction_index: 0,
    }
}
