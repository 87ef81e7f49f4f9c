//! Cache Service Module
//!
//! Namespaced get/set/delete/exists/expire over a `KvStore`. Store failures
//! never escape: they are reported to the observer and turned into a miss or
//! a `false` result, so an unavailable store degrades to "always recompute".

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::backend::KvStore;
use crate::cache::{
    CacheEvent, CacheObserver, CacheStats, CacheValue, Memoizer, StoreOp, TracingObserver,
};
use crate::error::{Result, StoreError};

// == Cache ==
/// A namespaced, JSON-aware cache over a shared store connection.
///
/// Cloning is cheap; clones share the store, the counters and the observer.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn KvStore>,
    namespace: String,
    stats: Arc<CacheStats>,
    observer: Arc<dyn CacheObserver>,
}

impl Cache {
    // == Constructor ==
    /// Creates a cache whose keys are all prefixed with `namespace`.
    pub fn new(store: Arc<dyn KvStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            stats: Arc::new(CacheStats::new()),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replaces the default `tracing` observer.
    pub fn with_observer(mut self, observer: Arc<dyn CacheObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Shares counters with other caches.
    pub fn with_stats(mut self, stats: Arc<CacheStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn stats(&self) -> &Arc<CacheStats> {
        &self.stats
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    /// Namespace-qualified store key.
    pub fn qualify(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    pub(crate) fn emit(&self, event: CacheEvent<'_>) {
        self.stats.on_event(&event);
        self.observer.on_event(&event);
    }

    pub(crate) fn store_failed(&self, key: &str, op: StoreOp, err: &StoreError) {
        let error = err.to_string();
        self.emit(CacheEvent::StoreError {
            key,
            op,
            error: &error,
        });
    }

    // == Set ==
    /// Stores a value, with expiry after `ttl` seconds when given.
    ///
    /// Returns false if the store failed; the failure is observed, not raised.
    /// A zero TTL is refused on every backend and also returns false.
    pub async fn set(&self, key: &str, value: impl Into<CacheValue>, ttl: Option<u64>) -> bool {
        let key = self.qualify(key);
        if ttl == Some(0) {
            tracing::warn!(key = %key, "refusing to store with a zero TTL");
            return false;
        }
        let bytes = value.into().encode();

        let outcome = match ttl {
            Some(seconds) => self.store.set_ex(&key, seconds, &bytes).await,
            None => self.store.set(&key, &bytes).await,
        };

        match outcome {
            Ok(stored) => {
                if stored {
                    self.emit(CacheEvent::Set { key: &key, ttl });
                }
                stored
            }
            Err(err) => {
                self.store_failed(&key, StoreOp::Set, &err);
                false
            }
        }
    }

    /// Serializes `value` to JSON and stores it.
    ///
    /// # Errors
    /// `CacheError::Serialization` if `value` cannot be encoded. Store
    /// failures still come back as `Ok(false)`.
    pub async fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<u64>,
    ) -> Result<bool> {
        let value = CacheValue::json(value)?;
        Ok(self.set(key, value, ttl).await)
    }

    // == Get ==
    /// Looks up a key, decoding JSON entries.
    pub async fn get(&self, key: &str) -> Option<CacheValue> {
        self.get_with(key, None, true).await
    }

    /// Looks up a key, returning `default` when absent or unavailable.
    pub async fn get_or(&self, key: &str, default: impl Into<CacheValue>) -> CacheValue {
        match self.get(key).await {
            Some(value) => value,
            None => default.into(),
        }
    }

    /// Full lookup. With `json_decode` off, JSON entries are returned as the
    /// raw text they were stored as.
    pub async fn get_with(
        &self,
        key: &str,
        default: Option<CacheValue>,
        json_decode: bool,
    ) -> Option<CacheValue> {
        let qualified = self.qualify(key);
        match self.fetch(&qualified, json_decode).await {
            Some(value) => {
                self.emit(CacheEvent::Hit { key: &qualified });
                Some(value)
            }
            None => {
                self.emit(CacheEvent::Miss { key: &qualified });
                default
            }
        }
    }

    /// Looks up a key and deserializes it into `T`.
    ///
    /// A value of the wrong shape is treated as a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let qualified = self.qualify(key);
        match self.fetch_typed(&qualified).await {
            Some(value) => {
                self.emit(CacheEvent::Hit { key: &qualified });
                Some(value)
            }
            None => {
                self.emit(CacheEvent::Miss { key: &qualified });
                None
            }
        }
    }

    /// Raw lookup by qualified key; reports store errors and decode
    /// fallbacks but not hits or misses.
    pub(crate) async fn fetch(&self, qualified: &str, json_decode: bool) -> Option<CacheValue> {
        let raw = match self.store.get(qualified).await {
            Ok(raw) => raw?,
            Err(err) => {
                self.store_failed(qualified, StoreOp::Get, &err);
                return None;
            }
        };

        let (value, fell_back) = CacheValue::decode(raw, json_decode);
        if fell_back {
            self.emit(CacheEvent::DecodeFallback { key: qualified });
        }
        Some(value)
    }

    pub(crate) async fn fetch_typed<T: DeserializeOwned>(&self, qualified: &str) -> Option<T> {
        let json = match self.fetch(qualified, true).await? {
            CacheValue::Json(value) => value,
            CacheValue::Text(text) => Value::String(text),
            CacheValue::Bytes(_) => return None,
        };

        match serde_json::from_value(json) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(key = qualified, error = %err, "cached value has unexpected shape, ignoring");
                None
            }
        }
    }

    // == Delete ==
    /// Removes a key. Returns true only if something was deleted.
    pub async fn delete(&self, key: &str) -> bool {
        let key = self.qualify(key);
        match self.store.delete(&key).await {
            Ok(count) => {
                let removed = count > 0;
                self.emit(CacheEvent::Delete { key: &key, removed });
                removed
            }
            Err(err) => {
                self.store_failed(&key, StoreOp::Delete, &err);
                false
            }
        }
    }

    // == Exists ==
    pub async fn exists(&self, key: &str) -> bool {
        let key = self.qualify(key);
        self.store.exists(&key).await.unwrap_or_else(|err| {
            self.store_failed(&key, StoreOp::Exists, &err);
            false
        })
    }

    // == Expire ==
    /// Sets a new TTL on an existing key. False if absent or on failure.
    pub async fn expire(&self, key: &str, seconds: u64) -> bool {
        let key = self.qualify(key);
        self.store.expire(&key, seconds).await.unwrap_or_else(|err| {
            self.store_failed(&key, StoreOp::Expire, &err);
            false
        })
    }

    // == TTL ==
    /// Remaining TTL in seconds; `None` if absent, persistent, or on failure.
    pub async fn ttl(&self, key: &str) -> Option<u64> {
        let key = self.qualify(key);
        self.store.ttl(&key).await.unwrap_or_else(|err| {
            self.store_failed(&key, StoreOp::Ttl, &err);
            None
        })
    }

    // == Memoize ==
    /// Returns a memoizer whose results live under `key_prefix` in this
    /// namespace and expire after `ttl` seconds (never, if `None`).
    pub fn memoize(&self, key_prefix: impl Into<String>, ttl: Option<u64>) -> Memoizer {
        Memoizer::new(self.clone(), key_prefix.into(), ttl)
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStore;
    use serde_json::json;
    use std::time::Duration;

    fn new_cache(namespace: &str) -> Cache {
        Cache::new(Arc::new(MemoryStore::new()), namespace)
    }

    #[tokio::test]
    async fn test_user_scenario() {
        let cache = new_cache("users");

        assert!(cache.set("user:1", json!({"name": "Ann"}), Some(3600)).await);
        assert_eq!(
            cache.get("user:1").await,
            Some(CacheValue::Json(json!({"name": "Ann"})))
        );
        assert_eq!(
            cache.get_or("missing", "none").await,
            CacheValue::Text("none".to_string())
        );
        assert!(cache.delete("user:1").await);
        assert!(!cache.exists("user:1").await);
    }

    #[tokio::test]
    async fn test_keys_are_namespaced() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let cache = Cache::new(store.clone(), "users");

        cache.set("k", "v", None).await;

        assert!(store.exists("users:k").await.unwrap());
        assert!(!store.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_namespace_isolation() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let a = Cache::new(store.clone(), "a");
        let b = Cache::new(store, "b");

        a.set("shared", "from a", None).await;

        assert_eq!(b.get("shared").await, None);
        assert_eq!(
            b.get_or("shared", "default").await,
            CacheValue::Text("default".to_string())
        );
        assert!(!b.delete("shared").await);
        assert!(a.exists("shared").await);
    }

    #[tokio::test]
    async fn test_string_round_trip_is_not_json_decoded() {
        let cache = new_cache("t");

        cache.set("n", "123", None).await;
        assert_eq!(cache.get("n").await, Some(CacheValue::Text("123".to_string())));
    }

    #[tokio::test]
    async fn test_get_raw_mode() {
        let cache = new_cache("t");

        cache.set("doc", json!({"a": [1, 2]}), None).await;
        assert_eq!(
            cache.get_with("doc", None, false).await,
            Some(CacheValue::Text(r#"{"a":[1,2]}"#.to_string()))
        );
    }

    #[tokio::test]
    async fn test_untagged_foreign_value_falls_back_to_text() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        store.set("t:legacy", b"plain answer").await.unwrap();
        let cache = Cache::new(store, "t");

        assert_eq!(
            cache.get("legacy").await,
            Some(CacheValue::Text("plain answer".to_string()))
        );
        assert_eq!(cache.stats().snapshot().decode_fallbacks, 1);
    }

    #[tokio::test]
    async fn test_set_json_and_get_json() {
        #[derive(Debug, PartialEq, Serialize, serde::Deserialize)]
        struct User {
            id: u32,
            name: String,
        }

        let cache = new_cache("t");
        let user = User {
            id: 123,
            name: "John Doe".to_string(),
        };

        assert!(cache.set_json("user:123", &user, Some(60)).await.unwrap());
        assert_eq!(cache.get_json::<User>("user:123").await, Some(user));
        assert_eq!(cache.get_json::<Vec<u8>>("user:123").await, None);
    }

    #[tokio::test]
    async fn test_set_json_serialization_error_propagates() {
        let cache = new_cache("t");
        let mut bad = std::collections::HashMap::new();
        bad.insert(vec![1u8], 1);

        assert!(cache.set_json("bad", &bad, None).await.is_err());
        assert!(!cache.exists("bad").await);
    }

    #[tokio::test]
    async fn test_expire_and_ttl() {
        let cache = new_cache("t");

        assert!(!cache.expire("missing", 10).await);
        cache.set("k", "v", None).await;
        assert_eq!(cache.ttl("k").await, None);
        assert!(cache.expire("k", 10).await);
        assert!(cache.ttl("k").await.unwrap() >= 9);
    }

    #[tokio::test]
    async fn test_ttl_elapses() {
        let cache = new_cache("t");

        cache.set("short", json!([1, 2, 3]), Some(1)).await;
        assert!(cache.get("short").await.is_some());

        tokio::time::sleep(Duration::from_millis(1200)).await;

        assert_eq!(cache.get("short").await, None);
        assert_eq!(
            cache.get_or("short", "gone").await,
            CacheValue::Text("gone".to_string())
        );
    }

    #[tokio::test]
    async fn test_zero_ttl_is_refused() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let cache = Cache::new(store.clone(), "t");

        assert!(!cache.set("z", "v", Some(0)).await);
        assert!(!cache.set_json("z", &[1, 2], Some(0)).await.unwrap());
        assert!(!store.exists("t:z").await.unwrap());
        assert_eq!(cache.stats().snapshot().sets, 0);
        assert_eq!(cache.stats().snapshot().store_errors, 0);
    }

    #[tokio::test]
    async fn test_stats_track_hits_and_misses() {
        let cache = new_cache("t");

        cache.set("k", "v", None).await;
        cache.get("k").await;
        cache.get("nope").await;

        let snapshot = cache.stats().snapshot();
        assert_eq!(snapshot.hits, 1);
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.sets, 1);
    }
}
