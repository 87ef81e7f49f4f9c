//! Memory Store Module
//!
//! Process-local `KvStore` backed by a HashMap with lazy TTL expiration.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{KvStore, StoreResult, StoredEntry};

// == Memory Store ==
/// In-memory key-value store.
///
/// Expired entries are invisible to every read and removed either lazily on
/// access or in bulk by [`MemoryStore::purge_expired`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Purge Expired ==
    /// Removes all expired entries.
    ///
    /// Returns the number of entries removed.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        before - entries.len()
    }

    // == Length ==
    /// Number of entries held, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn insert(&self, key: &str, value: &[u8], ttl_secs: Option<u64>) {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), StoredEntry::new(value.to_vec(), ttl_secs));
    }

    /// Drops the entry if it has expired; returns whether a live entry remains.
    fn evict_if_expired(entries: &mut HashMap<String, StoredEntry>, key: &str) -> bool {
        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired: drop it under the write lock
        let mut entries = self.entries.write().await;
        Self::evict_if_expired(&mut entries, key);
        Ok(entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &[u8]) -> StoreResult<bool> {
        self.insert(key, value, None).await;
        Ok(true)
    }

    async fn set_ex(&self, key: &str, ttl_secs: u64, value: &[u8]) -> StoreResult<bool> {
        self.insert(key, value, Some(ttl_secs)).await;
        Ok(true)
    }

    async fn set_nx_ex(&self, key: &str, ttl_secs: u64, value: &[u8]) -> StoreResult<bool> {
        let mut entries = self.entries.write().await;
        if Self::evict_if_expired(&mut entries, key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), StoredEntry::new(value.to_vec(), Some(ttl_secs)));
        Ok(true)
    }

    async fn delete(&self, key: &str) -> StoreResult<u64> {
        let mut entries = self.entries.write().await;
        let live = Self::evict_if_expired(&mut entries, key);
        if live {
            entries.remove(key);
            Ok(1)
        } else {
            Ok(0)
        }
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).is_some_and(|entry| !entry.is_expired()))
    }

    async fn expire(&self, key: &str, seconds: u64) -> StoreResult<bool> {
        let mut entries = self.entries.write().await;
        if !Self::evict_if_expired(&mut entries, key) {
            return Ok(false);
        }
        if let Some(entry) = entries.get_mut(key) {
            entry.expire_in(seconds);
        }
        Ok(true)
    }

    async fn ttl(&self, key: &str) -> StoreResult<Option<u64>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .and_then(StoredEntry::ttl_remaining))
    }

    async fn compare_and_delete(&self, key: &str, expected: &[u8]) -> StoreResult<bool> {
        let mut entries = self.entries.write().await;
        if !Self::evict_if_expired(&mut entries, key) {
            return Ok(false);
        }
        let matches = entries
            .get(key)
            .is_some_and(|entry| entry.value.as_slice() == expected);
        if matches {
            entries.remove(key);
        }
        Ok(matches)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
