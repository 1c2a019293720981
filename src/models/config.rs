//! Service configuration
//!
//! Built once at startup from the environment and passed by value into the
//! components that need it. Nothing reads the environment after this.

use alloy_primitives::Address;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use super::errors::{AppError, AppResult};
use super::types::parse_address;
use crate::utils::constants::{
    get_rpc_env_key, DEFAULT_ALLOWED_ORIGIN, DEFAULT_CACHE_TTL_SECS, DEFAULT_CONTRACT_ADDRESS,
    DEFAULT_HOST, DEFAULT_LOG_LEVEL, DEFAULT_MAX_BLOCK_RANGE, DEFAULT_PORT,
    DEFAULT_RPC_MAX_RETRIES, DEFAULT_RPC_TIMEOUT_SECS, SUPPORTED_CHAIN_IDS,
};

/// Configuration for the Blockscope service
#[derive(Debug, Clone)]
pub struct Settings {
    /// chain id -> RPC endpoint, only for chains with a non-empty endpoint
    pub chain_endpoints: BTreeMap<u64, String>,
    /// Shared cache; in-process cache when absent
    pub redis_url: Option<String>,
    /// tracing filter directive (e.g. "INFO", "debug")
    pub log_level: String,
    /// Contract whose logs the logs endpoint serves
    pub contract_address: Address,
    /// Maximum (to - from) span of a log query
    pub max_block_range: u64,
    /// TTL of every cache entry
    pub cache_ttl: Duration,
    /// CORS origins
    pub allowed_origins: Vec<String>,
    pub host: String,
    pub port: u16,
    /// Per-request upstream timeout
    pub rpc_timeout: Duration,
    /// Transport retries after the first attempt of an upstream call
    pub rpc_max_retries: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chain_endpoints: BTreeMap::new(),
            redis_url: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            contract_address: Address::from_str(DEFAULT_CONTRACT_ADDRESS).unwrap_or_default(),
            max_block_range: DEFAULT_MAX_BLOCK_RANGE,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            rpc_timeout: Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS),
            rpc_max_retries: DEFAULT_RPC_MAX_RETRIES,
        }
    }
}

impl Settings {
    /// Load settings from process environment
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings from any key/value source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let chain_endpoints = SUPPORTED_CHAIN_IDS
            .iter()
            .filter_map(|&chain_id| {
                let env_key = get_rpc_env_key(chain_id)?;
                get(env_key).map(|url| (chain_id, url))
            })
            .collect();

        let contract_address = match get("CONTRACT_ADDRESS") {
            Some(raw) => parse_address(&raw)
                .map_err(|e| AppError::invalid_config("CONTRACT_ADDRESS", e.message))?,
            None => defaults.contract_address,
        };

        let max_block_range = parse_or("MAX_BLOCK_RANGE", get("MAX_BLOCK_RANGE"), defaults.max_block_range)?;

        let cache_ttl_secs: u64 = parse_or("CACHE_TTL", get("CACHE_TTL"), DEFAULT_CACHE_TTL_SECS)?;
        if cache_ttl_secs == 0 {
            return Err(AppError::invalid_config("CACHE_TTL", "must be greater than zero"));
        }

        let allowed_origins = get("ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.allowed_origins);

        // Railway-style PORT wins over the service-specific variable
        let port = parse_or(
            "PORT",
            get("PORT").or_else(|| get("BLOCKSCOPE_PORT")),
            defaults.port,
        )?;

        let rpc_timeout_secs = parse_or("RPC_TIMEOUT_SECS", get("RPC_TIMEOUT_SECS"), DEFAULT_RPC_TIMEOUT_SECS)?;

        Ok(Self {
            chain_endpoints,
            redis_url: get("REDIS_URL"),
            log_level: get("LOG_LEVEL").unwrap_or(defaults.log_level),
            contract_address,
            max_block_range,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            allowed_origins,
            host: get("BLOCKSCOPE_HOST").unwrap_or(defaults.host),
            port,
            rpc_timeout: Duration::from_secs(rpc_timeout_secs),
            rpc_max_retries: parse_or("RPC_MAX_RETRIES", get("RPC_MAX_RETRIES"), defaults.rpc_max_retries)?,
        })
    }

    /// Checksummed contract address
    pub fn contract_checksum(&self) -> String {
        self.contract_address.to_checksum(None)
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value
            .parse()
            .map_err(|e| AppError::invalid_config(key, format!("{:?} ({})", value, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::ErrorCode;
    use crate::utils::constants::{CHAIN_ID_AVALANCHE, CHAIN_ID_ETHEREUM};
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert!(settings.chain_endpoints.is_empty());
        assert_eq!(settings.max_block_range, 3000);
        assert_eq!(settings.cache_ttl, Duration::from_secs(180));
        assert_eq!(settings.contract_checksum(), DEFAULT_CONTRACT_ADDRESS);
        assert_eq!(settings.port, 8000);
        assert!(settings.redis_url.is_none());
    }

    #[test]
    fn test_missing_endpoint_means_absent_chain() {
        let settings = Settings::from_lookup(lookup(&[
            ("AVAX_RPC", "https://api.avax.network/ext/bc/C/rpc"),
            ("ETH_RPC", "   "),
        ]))
        .unwrap();
        assert!(settings.chain_endpoints.contains_key(&CHAIN_ID_AVALANCHE));
        assert!(!settings.chain_endpoints.contains_key(&CHAIN_ID_ETHEREUM));
    }

    #[test]
    fn test_contract_address_is_checksummed() {
        let settings = Settings::from_lookup(lookup(&[(
            "CONTRACT_ADDRESS",
            "0x66357dcace80431aee0a7507e2e361b7e2402370",
        )]))
        .unwrap();
        assert_eq!(settings.contract_checksum(), DEFAULT_CONTRACT_ADDRESS);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Settings::from_lookup(lookup(&[("CONTRACT_ADDRESS", "0xnothex")])).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigInvalidValue);

        let err = Settings::from_lookup(lookup(&[("MAX_BLOCK_RANGE", "-5")])).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigInvalidValue);

        let err = Settings::from_lookup(lookup(&[("CACHE_TTL", "0")])).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigInvalidValue);
    }

    #[test]
    fn test_allowed_origins_list() {
        let settings = Settings::from_lookup(lookup(&[(
            "ALLOWED_ORIGINS",
            "http://a.example, http://b.example,",
        )]))
        .unwrap();
        assert_eq!(settings.allowed_origins, vec!["http://a.example", "http://b.example"]);
    }
}
