//! Shared test fixtures.

use async_trait::async_trait;
use memo_cache::backend::{KvStore, StoreResult};
use memo_cache::StoreError;

/// A store whose every call fails, as if Redis were down.
pub struct DownStore;

fn refused<T>() -> StoreResult<T> {
    Err(StoreError::Unavailable("connection refused".to_string()))
}

#[async_trait]
impl KvStore for DownStore {
    async fn get(&self, _key: &str) -> StoreResult<Option<Vec<u8>>> {
        refused()
    }
    async fn set(&self, _key: &str, _value: &[u8]) -> StoreResult<bool> {
        refused()
    }
    async fn set_ex(&self, _key: &str, _ttl: u64, _value: &[u8]) -> StoreResult<bool> {
        refused()
    }
    async fn set_nx_ex(&self, _key: &str, _ttl: u64, _value: &[u8]) -> StoreResult<bool> {
        refused()
    }
    async fn delete(&self, _key: &str) -> StoreResult<u64> {
        refused()
    }
    async fn exists(&self, _key: &str) -> StoreResult<bool> {
        refused()
    }
    async fn expire(&self, _key: &str, _seconds: u64) -> StoreResult<bool> {
        refused()
    }
    async fn ttl(&self, _key: &str) -> StoreResult<Option<u64>> {
        refused()
    }
    async fn compare_and_delete(&self, _key: &str, _expected: &[u8]) -> StoreResult<bool> {
        refused()
    }
    async fn ping(&self) -> StoreResult<()> {
        refused()
    }
}
