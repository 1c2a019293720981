//! Core data types for Blockscope

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::errors::{AppError, AppResult};

/// Inclusive block range, already resolved and bound-checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub from: u64,
    pub to: u64,
}

impl BlockRange {
    /// Number of blocks past `from` (to - from); zero when `to` is behind `from`
    pub fn span(&self) -> u64 {
        self.to.saturating_sub(self.from)
    }
}

/// Validated balance query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceQuery {
    pub chain_id: u64,
    pub address: Address,
    pub block_number: u64,
}

/// Validated log query. `to_block` of `None` means "current head".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogsQuery {
    pub from_block: u64,
    pub to_block: Option<u64>,
}

impl LogsQuery {
    /// Rejects an explicit `to_block` below `from_block`
    pub fn new(from_block: u64, to_block: Option<u64>) -> AppResult<Self> {
        if let Some(to) = to_block {
            if to < from_block {
                return Err(AppError::invalid_range(from_block, to));
            }
        }
        Ok(Self { from_block, to_block })
    }
}

/// Balance result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceResponse {
    /// Checksummed address from the request
    pub address: String,
    /// Native balance in wei
    #[serde(with = "u256_decimal")]
    pub balance: U256,
}

/// One emitted event. Byte fields are lowercase 0x-prefixed hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub address: String,
    #[serde(alias = "blockHash")]
    pub block_hash: String,
    #[serde(alias = "blockNumber")]
    pub block_number: u64,
    pub data: String,
    #[serde(alias = "logIndex")]
    pub log_index: u64,
    /// Set when the originating block was orphaned
    pub removed: bool,
    pub topics: Vec<String>,
    #[serde(alias = "transactionHash")]
    pub transaction_hash: String,
    #[serde(alias = "transactionIndex")]
    pub transaction_index: u64,
}

/// Logs result, in provider order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogsResponse {
    pub logs: Vec<LogRecord>,
}

/// Lowercase 0x-prefixed hex of any byte slice
pub fn hex_prefixed(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse an address the way wallets expect: 0x + 40 hex chars, and when the
/// input mixes upper and lower case it must be a valid EIP-55 checksum.
pub fn parse_address(raw: &str) -> AppResult<Address> {
    let raw = raw.trim();
    let body = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);

    if body.len() != 40 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AppError::invalid_address("Invalid Ethereum address"));
    }

    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
    if has_upper && has_lower {
        let prefixed = format!("0x{}", body);
        return Address::parse_checksummed(&prefixed, None)
            .map_err(|_| AppError::invalid_address("Invalid Ethereum address checksum"));
    }

    Address::from_str(body).map_err(|_| AppError::invalid_address("Invalid Ethereum address"))
}

/// Serializes a U256 as a bare JSON integer (no quotes, no hex) so balances
/// above 2^64 survive intact.
mod u256_decimal {
    use alloy_primitives::U256;
    use serde::{de::Error as _, ser::Error as _, Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::value::RawValue;

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        let raw = RawValue::from_string(value.to_string()).map_err(S::Error::custom)?;
        raw.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw: Box<RawValue> = Deserialize::deserialize(deserializer)?;
        let text = raw.get().trim_matches('"');
        U256::from_str_radix(text, 10).map_err(D::Error::custom)
    }
}
