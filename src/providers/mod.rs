//! Providers Module - Upstream chain connections
//!
//! `ChainClient` is the seam between the query layer and whatever talks to a
//! node. `RpcProvider` is the JSON-RPC over HTTP implementation.

pub mod rpc;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;

use crate::models::{AppResult, LogRecord};

pub use rpc::*;

/// A live, shareable link to one chain's node
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Chain id this client is connected to
    fn chain_id(&self) -> u64;

    /// Endpoint with credentials masked, safe for logs
    fn masked_url(&self) -> String;

    /// Current head block number
    async fn block_number(&self) -> AppResult<u64>;

    /// Native balance of `address` at `block_number`
    async fn get_balance(&self, address: Address, block_number: u64) -> AppResult<U256>;

    /// Logs emitted by `address` within `[from_block, to_block]`, in provider order
    async fn get_logs(
        &self,
        address: Address,
        from_block: u64,
        to_block: u64,
    ) -> AppResult<Vec<LogRecord>>;

    /// Release the connection. Calls after this fail.
    async fn close(&self) -> AppResult<()>;
}
