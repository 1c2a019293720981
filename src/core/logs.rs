//! Log query
//!
//! Events emitted by one contract over a block range. An open upper bound
//! resolves to the chain head first; the range guard runs before the
//! provider is asked for logs.

use alloy_primitives::Address;
use tracing::{debug, info};

use super::range_guard::RangeGuard;
use crate::models::{AppResult, LogsResponse};
use crate::providers::ChainClient;

pub async fn logs_in_range(
    client: &dyn ChainClient,
    guard: &RangeGuard,
    address: Address,
    from_block: u64,
    to_block: Option<u64>,
) -> AppResult<LogsResponse> {
    let resolved_to = match to_block {
        Some(to) => to,
        None => {
            let head = client.block_number().await?;
            debug!("📏 to_block omitted, resolved to head {}", head);
            head
        }
    };

    let range = guard.bound(from_block, resolved_to)?;
    let logs = client.get_logs(address, range.from, range.to).await?;

    info!(
        "📜 {} logs for {} in blocks {}..={} (chain {})",
        logs.len(),
        address,
        range.from,
        range.to,
        client.chain_id()
    );

    Ok(LogsResponse { logs })
}
