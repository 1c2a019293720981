//! Constants Module - Single Source of Truth
//!
//! Chain ids, environment variable names and defaults used across the
//! service. Other modules import from here instead of hardcoding values.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "Blockscope";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for upstream RPC requests
pub const USER_AGENT: &str = concat!("Blockscope/", env!("CARGO_PKG_VERSION"));

// ============================================
// RPC CONSTANTS
// ============================================

/// Default timeout for RPC requests (seconds)
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 10;

/// Default transport retries after the first attempt of an RPC call
pub const DEFAULT_RPC_MAX_RETRIES: u32 = 3;

/// Base retry delay in milliseconds
pub const RPC_BASE_RETRY_MS: u64 = 250;

/// Maximum retry delay in milliseconds
pub const RPC_MAX_RETRY_MS: u64 = 4000;

/// Jitter percentage applied to each retry delay
pub const RETRY_JITTER_PERCENT: u64 = 20;

// ============================================
// QUERY / CACHE CONSTANTS
// ============================================

/// Default cache TTL (seconds)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 180;

/// Default maximum span of a log query (Ankr-style provider limit)
pub const DEFAULT_MAX_BLOCK_RANGE: u64 = 3000;

/// Contract whose logs are served by the logs endpoint
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x66357dCaCe80431aee0A7507e2E361B7e2402370";

/// Cache key prefix for balance-at-block queries
pub const BALANCE_CACHE_PREFIX: &str = "balance_by_block";

/// Cache key prefix for logs-by-range queries
pub const LOGS_CACHE_PREFIX: &str = "logs_by_block_period";

/// Interval between sweeps of expired in-memory cache entries (seconds)
pub const CACHE_CLEANUP_INTERVAL_SECS: u64 = 60;

// ============================================
// SERVER CONSTANTS
// ============================================

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:8000";
pub const DEFAULT_LOG_LEVEL: &str = "INFO";

/// In-flight request cap; excess requests wait for a slot
pub const MAX_CONCURRENT_REQUESTS: usize = 512;

/// Header carrying the per-request correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

// ============================================
// CHAIN IDS - Single Source of Truth
// ============================================

/// Ethereum Mainnet
pub const CHAIN_ID_ETHEREUM: u64 = 1;
/// Avalanche C-Chain
pub const CHAIN_ID_AVALANCHE: u64 = 43114;

/// Chain used when a query omits chain_id
pub const DEFAULT_CHAIN_ID: u64 = CHAIN_ID_AVALANCHE;

/// All chains the service knows how to configure
pub const SUPPORTED_CHAIN_IDS: [u64; 2] = [CHAIN_ID_ETHEREUM, CHAIN_ID_AVALANCHE];

/// Environment variable holding the RPC endpoint for a chain
pub fn get_rpc_env_key(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        CHAIN_ID_ETHEREUM => Some("ETH_RPC"),
        CHAIN_ID_AVALANCHE => Some("AVAX_RPC"),
        _ => None,
    }
}

/// Human-readable chain name
pub fn get_chain_name(chain_id: u64) -> &'static str {
    match chain_id {
        CHAIN_ID_ETHEREUM => "Ethereum",
        CHAIN_ID_AVALANCHE => "Avalanche",
        _ => "Unknown",
    }
}
