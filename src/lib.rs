//! Blockscope Library
//!
//! Read-only queries against EVM chains behind a shared cache:
//! - native balance of an address at a given block, on any configured chain
//! - event logs of one contract over a bounded block range
//!
//! Identical requests inside the cache TTL are answered without touching
//! the upstream RPC provider.

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::{
    CacheAside, CacheLookup, CacheStats, ChainRegistry, ClientHandle, QueryFingerprint,
    QueryService, RangeGuard,
};
pub use models::{
    AppError, AppResult, BalanceQuery, BalanceResponse, BlockRange, ErrorCode, LogRecord,
    LogsQuery, LogsResponse, Settings,
};
pub use providers::{ChainClient, RpcProvider};
pub use utils::cache::{CacheStore, MemoryCache, RedisCache};
