//! Query Service
//!
//! The two public queries, each wrapped in the cache-aside executor:
//! - balance of an address at a block, on any registered chain
//! - logs of the configured contract over a block range, on the default chain
//!
//! Cache keys come from the validated query, never from the raw request, so
//! every spelling of one query shares a single entry.

use alloy_primitives::Address;
use std::sync::Arc;

use super::balance::balance_at;
use super::cache_aside::{CacheAside, QueryFingerprint};
use super::logs::logs_in_range;
use super::range_guard::RangeGuard;
use super::registry::ChainRegistry;
use crate::models::{AppResult, BalanceQuery, BalanceResponse, LogsQuery, LogsResponse};
use crate::utils::constants::{BALANCE_CACHE_PREFIX, DEFAULT_CHAIN_ID, LOGS_CACHE_PREFIX};

/// Key for a balance query: chain id, checksummed address, block number
pub fn balance_fingerprint(query: &BalanceQuery) -> QueryFingerprint {
    QueryFingerprint::from_params(
        BALANCE_CACHE_PREFIX,
        &[
            ("chain_id", query.chain_id.to_string()),
            ("address", query.address.to_checksum(None)),
            ("block_number", query.block_number.to_string()),
        ],
    )
}

/// Key for a logs query. An open upper bound is keyed as `head`.
pub fn logs_fingerprint(query: &LogsQuery) -> QueryFingerprint {
    let to_block = query
        .to_block
        .map(|to| to.to_string())
        .unwrap_or_else(|| "head".to_string());
    QueryFingerprint::from_params(
        LOGS_CACHE_PREFIX,
        &[
            ("from_block", query.from_block.to_string()),
            ("to_block", to_block),
        ],
    )
}

pub struct QueryService {
    registry: Arc<ChainRegistry>,
    cache: Arc<CacheAside>,
    guard: RangeGuard,
    contract_address: Address,
}

impl QueryService {
    pub fn new(
        registry: Arc<ChainRegistry>,
        cache: Arc<CacheAside>,
        guard: RangeGuard,
        contract_address: Address,
    ) -> Self {
        Self {
            registry,
            cache,
            guard,
            contract_address,
        }
    }

    /// Balance at a block. A cached answer is served before the chain id is
    /// even looked at.
    pub async fn balance_by_block(&self, query: &BalanceQuery) -> AppResult<BalanceResponse> {
        let key = balance_fingerprint(query);
        let BalanceQuery {
            chain_id,
            address,
            block_number,
        } = *query;

        self.cache
            .execute(&key, || async move {
                let client = self.registry.resolve(chain_id)?;
                balance_at(client.as_ref(), address, block_number).await
            })
            .await
    }

    /// Logs of the configured contract on the default chain
    pub async fn logs_by_block_period(&self, query: &LogsQuery) -> AppResult<LogsResponse> {
        let key = logs_fingerprint(query);
        let LogsQuery {
            from_block,
            to_block,
        } = *query;

        self.cache
            .execute(&key, || async move {
                let client = self.registry.resolve(DEFAULT_CHAIN_ID)?;
                logs_in_range(
                    client.as_ref(),
                    &self.guard,
                    self.contract_address,
                    from_block,
                    to_block,
                )
                .await
            })
            .await
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &CacheAside {
        &self.cache
    }

    pub fn max_block_range(&self) -> u64 {
        self.guard.max_range()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::ClientHandle;
    use crate::core::test_support::{sample_log, BrokenCache, MockChainClient};
    use crate::models::{parse_address, ErrorCode};
    use crate::utils::cache::{CacheStore, MemoryCache};
    use alloy_primitives::U256;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn service_with(client: Arc<MockChainClient>, store: Arc<dyn CacheStore>) -> QueryService {
        let registry = ChainRegistry::from_clients([client as ClientHandle]).unwrap();
        QueryService::new(
            Arc::new(registry),
            Arc::new(CacheAside::new(store, Duration::from_secs(180))),
            RangeGuard::new(3000),
            Address::repeat_byte(0x66),
        )
    }

    fn balance_query(chain_id: u64, block_number: u64) -> BalanceQuery {
        BalanceQuery {
            chain_id,
            address: Address::ZERO,
            block_number,
        }
    }

    #[test]
    fn test_address_spelling_does_not_change_balance_key() {
        let lower = parse_address("0x000000000000000000000000000000000000dead").unwrap();
        let checksummed = parse_address("0x000000000000000000000000000000000000dEaD").unwrap();
        let key = |address| {
            balance_fingerprint(&BalanceQuery {
                chain_id: 43114,
                address,
                block_number: 5,
            })
        };

        assert_eq!(key(lower), key(checksummed));
        assert!(key(lower).as_str().starts_with("balance_by_block:"));
    }

    #[test]
    fn test_balance_key_covers_every_field() {
        let base = balance_fingerprint(&balance_query(43114, 5));
        assert_ne!(base, balance_fingerprint(&balance_query(1, 5)));
        assert_ne!(base, balance_fingerprint(&balance_query(43114, 6)));
        assert_ne!(
            base,
            balance_fingerprint(&BalanceQuery {
                address: Address::repeat_byte(0x01),
                ..balance_query(43114, 5)
            })
        );
    }

    #[test]
    fn test_logs_key_open_end_is_head() {
        let open = logs_fingerprint(&LogsQuery::new(5, None).unwrap());
        let closed = logs_fingerprint(&LogsQuery::new(5, Some(10)).unwrap());
        assert_ne!(open, closed);
        assert_eq!(open, logs_fingerprint(&LogsQuery::new(5, None).unwrap()));
        assert!(open.as_str().starts_with("logs_by_block_period:"));
    }

    #[tokio::test]
    async fn test_balance_cached_on_second_call() {
        let client = Arc::new(MockChainClient::new(43114).with_balance(U256::from(42u64)));
        let service = service_with(client.clone(), Arc::new(MemoryCache::new()));
        let query = balance_query(43114, 1);

        let first = service.balance_by_block(&query).await.unwrap();
        let second = service.balance_by_block(&query).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.balance, U256::from(42u64));
        assert_eq!(client.balance_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsupported_chain_makes_no_upstream_call() {
        let client = Arc::new(MockChainClient::new(43114));
        let service = service_with(client.clone(), Arc::new(MemoryCache::new()));

        let err = service
            .balance_by_block(&balance_query(99999, 1))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ChainNotSupported);
        assert_eq!(err.message, "Chain ID 99999 is not supported");
        assert_eq!(client.upstream_calls(), 0);
    }

    #[tokio::test]
    async fn test_logs_range_too_large() {
        let client = Arc::new(MockChainClient::new(43114));
        let service = service_with(client.clone(), Arc::new(MemoryCache::new()));
        let query = LogsQuery::new(0, Some(4000)).unwrap();

        let err = service.logs_by_block_period(&query).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RangeTooLarge);
        assert_eq!(client.upstream_calls(), 0);
    }

    #[tokio::test]
    async fn test_logs_use_default_chain_and_cache() {
        let client = Arc::new(MockChainClient::new(43114).with_logs(vec![sample_log(5, 0)]));
        let service = service_with(client.clone(), Arc::new(MemoryCache::new()));
        let query = LogsQuery::new(0, Some(10)).unwrap();

        let first = service.logs_by_block_period(&query).await.unwrap();
        let second = service.logs_by_block_period(&query).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.logs.len(), 1);
        assert_eq!(client.logs_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_broken_cache_still_answers() {
        let client = Arc::new(MockChainClient::new(43114));
        let service = service_with(client.clone(), Arc::new(BrokenCache::default()));
        let query = balance_query(43114, 1);

        for _ in 0..2 {
            let response = service.balance_by_block(&query).await.unwrap();
            assert_eq!(response.balance, U256::ZERO);
        }
        assert_eq!(client.balance_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_upstream_error_not_cached() {
        let client = Arc::new(MockChainClient::new(43114).with_upstream_error("header not found"));
        let service = service_with(client.clone(), Arc::new(MemoryCache::new()));
        let query = balance_query(43114, 99_999_999);

        for _ in 0..2 {
            let err = service.balance_by_block(&query).await.unwrap_err();
            assert_eq!(err.code, ErrorCode::UpstreamRpc);
        }
        assert_eq!(client.balance_calls.load(Ordering::SeqCst), 2);
    }
}
