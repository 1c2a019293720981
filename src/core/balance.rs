//! Balance query
//!
//! Native balance of one address at one block, straight from the provider.

use alloy_primitives::Address;
use tracing::debug;

use crate::models::{AppResult, BalanceResponse};
use crate::providers::ChainClient;

/// Fetch the balance of `address` as of `block_number`. Provider errors
/// (including "block not found") come back unchanged.
pub async fn balance_at(
    client: &dyn ChainClient,
    address: Address,
    block_number: u64,
) -> AppResult<BalanceResponse> {
    debug!(
        "💰 eth_getBalance chain={} address={} block={}",
        client.chain_id(),
        address,
        block_number
    );

    let balance = client.get_balance(address, block_number).await?;

    Ok(BalanceResponse {
        address: address.to_checksum(None),
        balance,
    })
}
