//! Store Backends
//!
//! The key-value contract consumed by the cache, with a Redis implementation
//! and an in-process memory implementation.

mod entry;
mod memory;
mod redis_store;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::{CacheError, StoreError};

pub use entry::StoredEntry;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// Result of a single store round-trip.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// == KvStore Trait ==
/// Byte-oriented key-value store with optional per-key expiry.
///
/// Single-key operations are expected to be atomic at the store level.
/// Implementations do not namespace keys; that is the cache's job.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Returns the raw value, or `None` if absent or expired.
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Stores a value without expiry, replacing any previous TTL.
    async fn set(&self, key: &str, value: &[u8]) -> StoreResult<bool>;

    /// Stores a value that expires after `ttl_secs` seconds.
    async fn set_ex(&self, key: &str, ttl_secs: u64, value: &[u8]) -> StoreResult<bool>;

    /// Stores a value with expiry only if the key does not exist.
    ///
    /// Returns `true` when this call created the key.
    async fn set_nx_ex(&self, key: &str, ttl_secs: u64, value: &[u8]) -> StoreResult<bool>;

    /// Removes a key, returning the number of keys removed.
    async fn delete(&self, key: &str) -> StoreResult<u64>;

    /// Returns true if the key is present and not expired.
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Sets a key's TTL. Returns `false` if the key does not exist.
    async fn expire(&self, key: &str, seconds: u64) -> StoreResult<bool>;

    /// Remaining TTL in seconds; `None` if absent or without expiry.
    async fn ttl(&self, key: &str) -> StoreResult<Option<u64>>;

    /// Deletes the key only if its current value equals `expected`.
    async fn compare_and_delete(&self, key: &str, expected: &[u8]) -> StoreResult<bool>;

    /// Round-trip liveness check.
    async fn ping(&self) -> StoreResult<()>;
}

// == Store Handle ==
/// A connected store plus, for the memory backend, the concrete handle the
/// sweeper needs.
#[derive(Clone)]
pub struct StoreHandle {
    pub store: Arc<dyn KvStore>,
    pub memory: Option<Arc<MemoryStore>>,
}

/// Connects to the store named by `config.store_url`.
///
/// # Schemes
/// - `redis://`, `rediss://` - Redis via a managed connection
/// - `memory://` - process-local map
///
/// # Errors
/// `CacheError::Config` for an unknown scheme or a malformed Redis URL.
/// An unreachable Redis server is not an error here; the connection is
/// retried on first use.
pub async fn connect(config: &Config) -> Result<StoreHandle, CacheError> {
    let url = config.store_url.trim();

    if url.starts_with("memory://") {
        let memory = Arc::new(MemoryStore::new());
        return Ok(StoreHandle {
            store: memory.clone(),
            memory: Some(memory),
        });
    }

    if url.starts_with("redis://") || url.starts_with("rediss://") {
        let store = RedisStore::connect(url, config.connect_timeout, config.response_timeout)
            .await?;
        return Ok(StoreHandle {
            store: Arc::new(store),
            memory: None,
        });
    }

    Err(CacheError::Config(format!(
        "unsupported store URL scheme: {}",
        url
    )))
}
