//! Cache-Aside Executor
//!
//! fingerprint -> lookup -> (hit: return) | (miss: compute -> populate -> return)
//!
//! Cache failures are recovered here and never reach the caller. Compute
//! failures reach the caller untouched and are never cached. Concurrent
//! misses on one fingerprint each run their own compute.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::models::AppResult;
use crate::utils::cache::CacheStore;

/// Cache key: `<prefix>:<sha256 hex of the canonical parameters>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryFingerprint(String);

impl QueryFingerprint {
    /// Fingerprint of an already-canonical string
    pub fn new(prefix: &str, canonical: &str) -> Self {
        let digest = Sha256::digest(canonical.as_bytes());
        Self(format!("{}:{}", prefix, hex::encode(digest)))
    }

    /// Fingerprint of resolved query parameters. Pairs are sorted and
    /// form-encoded first, so presentation order never matters.
    pub fn from_params(prefix: &str, params: &[(&str, String)]) -> Self {
        Self::new(prefix, &canonical_params(params))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `k1=v1&k2=v2` with pairs sorted by key then value
pub fn canonical_params(params: &[(&str, String)]) -> String {
    let mut pairs: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
    pairs.sort_unstable();
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// Outcome of a cache read
#[derive(Debug, PartialEq, Eq)]
pub enum CacheLookup<T> {
    Hit(T),
    Miss,
    /// Store failed or held an unreadable payload; callers treat it as a miss
    Unavailable,
}

/// Counters for health output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub backend: &'static str,
    pub hits: u64,
    pub misses: u64,
    pub unavailable: u64,
    pub writes: u64,
    pub write_failures: u64,
    pub ttl_secs: u64,
}

/// Cache-aside executor over any `CacheStore`
pub struct CacheAside {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    unavailable: AtomicU64,
    writes: AtomicU64,
    write_failures: AtomicU64,
}

impl CacheAside {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            unavailable: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
        }
    }

    /// Read and decode a cached payload
    pub async fn lookup<T: DeserializeOwned>(&self, key: &QueryFingerprint) -> CacheLookup<T> {
        match self.store.get(key.as_str()).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    info!("✅ CACHE HIT: {}", key);
                    CacheLookup::Hit(value)
                }
                Err(e) => {
                    self.unavailable.fetch_add(1, Ordering::Relaxed);
                    warn!("Cache payload for {} unreadable, treating as miss: {}", key, e);
                    CacheLookup::Unavailable
                }
            },
            Ok(None) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("📭 CACHE MISS: {}", key);
                CacheLookup::Miss
            }
            Err(e) => {
                self.unavailable.fetch_add(1, Ordering::Relaxed);
                warn!("Cache get failed for {}: {}", key, e);
                CacheLookup::Unavailable
            }
        }
    }

    /// Encode and store `value` with the configured TTL. Returns whether the
    /// write landed; failures are logged only.
    pub async fn populate<T: Serialize>(&self, key: &QueryFingerprint, value: &T) -> bool {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                self.write_failures.fetch_add(1, Ordering::Relaxed);
                warn!("Cache encode failed for {}: {}", key, e);
                return false;
            }
        };

        match self.store.set_ex(key.as_str(), &payload, self.ttl).await {
            Ok(()) => {
                self.writes.fetch_add(1, Ordering::Relaxed);
                debug!("💾 CACHE SET: {} (TTL: {}s)", key, self.ttl.as_secs());
                true
            }
            Err(e) => {
                self.write_failures.fetch_add(1, Ordering::Relaxed);
                warn!("Cache set failed for {}: {}", key, e);
                false
            }
        }
    }

    /// Return the cached value for `key`, or run `compute` once and cache
    /// its success.
    pub async fn execute<T, F, Fut>(&self, key: &QueryFingerprint, compute: F) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        if let CacheLookup::Hit(value) = self.lookup(key).await {
            return Ok(value);
        }

        let value = compute().await?;
        self.populate(key, &value).await;
        Ok(value)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            backend: self.store.backend(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            unavailable: self.unavailable.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            ttl_secs: self.ttl.as_secs(),
        }
    }
}
