//! Chain Client Registry
//!
//! Maps a chain id to its single live client. Filled once at startup,
//! read concurrently by every request, cleared once at shutdown.

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::models::{AppError, AppResult, ErrorCode, Settings};
use crate::providers::{ChainClient, RpcProvider};
use crate::utils::constants::get_chain_name;

/// Shared handle to a chain client
pub type ClientHandle = Arc<dyn ChainClient>;

/// Owned registry of chain clients; pass it around behind an `Arc`
#[derive(Default)]
pub struct ChainRegistry {
    clients: DashMap<u64, ClientHandle>,
    initialized: AtomicBool,
}

impl ChainRegistry {
    /// Empty, uninitialized registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect every configured chain through `connect`. Chains whose client
    /// cannot be built are skipped with a warning; zero clients is fatal.
    pub fn initialize<F>(endpoints: &BTreeMap<u64, String>, connect: F) -> AppResult<Self>
    where
        F: Fn(u64, &str) -> AppResult<ClientHandle>,
    {
        let registry = Self::new();

        for (&chain_id, url) in endpoints {
            match connect(chain_id, url) {
                Ok(client) => {
                    info!(
                        "✅ Initialized RPC for chain {} ({}) at {}",
                        chain_id,
                        get_chain_name(chain_id),
                        client.masked_url()
                    );
                    registry.register(chain_id, client)?;
                }
                Err(e) => {
                    warn!("⚠️ Failed to initialize RPC for chain {}: {}", chain_id, e);
                }
            }
        }

        registry.finish()?;
        Ok(registry)
    }

    /// Production wiring: one `RpcProvider` per configured endpoint
    pub fn from_settings(settings: &Settings) -> AppResult<Self> {
        let timeout = settings.rpc_timeout;
        let retries = settings.rpc_max_retries;
        Self::initialize(&settings.chain_endpoints, |chain_id, url| {
            let provider = RpcProvider::connect(chain_id, url, timeout, retries)?;
            Ok(Arc::new(provider) as ClientHandle)
        })
    }

    /// Build directly from already-connected clients, keyed by their own chain id
    pub fn from_clients(clients: impl IntoIterator<Item = ClientHandle>) -> AppResult<Self> {
        let registry = Self::new();
        for client in clients {
            registry.register(client.chain_id(), client)?;
        }
        registry.finish()?;
        Ok(registry)
    }

    /// Insert a client. At most one client per chain id.
    pub fn register(&self, chain_id: u64, client: ClientHandle) -> AppResult<()> {
        use dashmap::mapref::entry::Entry;

        match self.clients.entry(chain_id) {
            Entry::Occupied(_) => Err(AppError::new(
                ErrorCode::RegistryDuplicateChain,
                format!("Chain ID {} already has a client", chain_id),
            )),
            Entry::Vacant(slot) => {
                slot.insert(client);
                Ok(())
            }
        }
    }

    /// Mark registration complete; fails if nothing was registered
    fn finish(&self) -> AppResult<()> {
        if self.clients.is_empty() {
            return Err(AppError::no_clients());
        }
        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    /// Client for `chain_id`. Always the same instance until shutdown.
    pub fn resolve(&self, chain_id: u64) -> AppResult<ClientHandle> {
        if !self.is_initialized() {
            return Err(AppError::uninitialized());
        }
        self.clients
            .get(&chain_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| AppError::chain_not_supported(chain_id))
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Registered chain ids, ascending
    pub fn chain_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.clients.iter().map(|e| *e.key()).collect();
        ids.sort_unstable();
        ids
    }

    /// Close every client once and empty the registry. Close failures are
    /// logged and skipped; calling again is a no-op.
    pub async fn shutdown(&self) {
        self.initialized.store(false, Ordering::Release);

        // Drain before awaiting so no shard lock is held across a close
        let ids = self.chain_ids();
        let drained: Vec<(u64, ClientHandle)> = ids
            .into_iter()
            .filter_map(|id| self.clients.remove(&id))
            .collect();

        for (chain_id, client) in drained {
            match client.close().await {
                Ok(()) => info!("🔌 Closed RPC client for chain {}", chain_id),
                Err(e) => warn!("⚠️ Failed to close RPC client for chain {}: {}", chain_id, e),
            }
        }
    }
}
