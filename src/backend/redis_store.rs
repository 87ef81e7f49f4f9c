//! Redis Store Module
//!
//! `KvStore` implementation over a managed, auto-reconnecting Redis connection.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client, Script};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::{KvStore, StoreResult};
use crate::error::{CacheError, StoreError};

/// After a failed connect, calls fail fast for this long before the next attempt.
const RECONNECT_COOLDOWN: Duration = Duration::from_secs(1);

/// Deletes KEYS[1] only when it still holds ARGV[1].
const COMPARE_AND_DELETE_LUA: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

// == Redis Store ==
/// Redis-backed key-value store.
///
/// The connection is created once and then shared by every call. If the
/// server is down at startup, creation is retried on a later operation
/// instead of failing construction.
///
/// A connect attempt is a single try bounded by the connect timeout. While
/// the server stays down, at most one attempt is made per
/// `RECONNECT_COOLDOWN`; every other call fails immediately, so callers
/// degrade to misses instead of stalling.
pub struct RedisStore {
    client: Client,
    connect_timeout: Duration,
    response_timeout: Duration,
    conn: OnceCell<ConnectionManager>,
    last_failure: Mutex<Option<Instant>>,
    compare_and_delete: Script,
}

impl RedisStore {
    /// Opens a client for `url` and attempts an eager connection.
    ///
    /// # Errors
    /// `CacheError::Config` if the URL cannot be parsed.
    pub async fn connect(
        url: &str,
        connect_timeout: Duration,
        response_timeout: Duration,
    ) -> Result<Self, CacheError> {
        let client = Client::open(url)
            .map_err(|e| CacheError::Config(format!("invalid Redis URL: {}", e)))?;

        let store = Self {
            client,
            connect_timeout,
            response_timeout,
            conn: OnceCell::new(),
            last_failure: Mutex::new(None),
            compare_and_delete: Script::new(COMPARE_AND_DELETE_LUA),
        };

        match store.connection().await {
            Ok(_) => info!("Connected to Redis"),
            Err(e) => warn!(error = %e, "Redis unreachable at startup, will retry on use"),
        }

        Ok(store)
    }

    async fn connection(&self) -> StoreResult<ConnectionManager> {
        if let Some(conn) = self.conn.get() {
            return Ok(conn.clone());
        }
        if self.cooling_down() {
            return Err(StoreError::Unavailable(
                "redis unreachable, waiting before reconnecting".to_string(),
            ));
        }

        let result = self
            .conn
            .get_or_try_init(|| async {
                // One attempt per call; the cooldown paces reconnects
                let config = ConnectionManagerConfig::new()
                    .set_number_of_retries(0)
                    .set_connection_timeout(self.connect_timeout)
                    .set_response_timeout(self.response_timeout);
                let attempt = ConnectionManager::new_with_config(self.client.clone(), config);
                match tokio::time::timeout(self.connect_timeout, attempt).await {
                    Ok(conn) => conn.map_err(StoreError::from),
                    Err(_) => Err(StoreError::Unavailable(format!(
                        "redis connect timed out after {:?}",
                        self.connect_timeout
                    ))),
                }
            })
            .await;

        match result {
            Ok(conn) => Ok(conn.clone()),
            Err(err) => {
                *self.failure_slot() = Some(Instant::now());
                Err(err)
            }
        }
    }

    fn cooling_down(&self) -> bool {
        matches!(*self.failure_slot(), Some(at) if at.elapsed() < RECONNECT_COOLDOWN)
    }

    fn failure_slot(&self) -> std::sync::MutexGuard<'_, Option<Instant>> {
        self.last_failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8]) -> StoreResult<bool> {
        let mut conn = self.connection().await?;
        let _: () = conn.set(key, value).await?;
        Ok(true)
    }

    async fn set_ex(&self, key: &str, ttl_secs: u64, value: &[u8]) -> StoreResult<bool> {
        let mut conn = self.connection().await?;
        let _: () = conn.set_ex(key, value, ttl_secs).await?;
        Ok(true)
    }

    async fn set_nx_ex(&self, key: &str, ttl_secs: u64, value: &[u8]) -> StoreResult<bool> {
        let mut conn = self.connection().await?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn delete(&self, key: &str) -> StoreResult<u64> {
        let mut conn = self.connection().await?;
        let removed: u64 = conn.del(key).await?;
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.connection().await?;
        let present: bool = conn.exists(key).await?;
        Ok(present)
    }

    async fn expire(&self, key: &str, seconds: u64) -> StoreResult<bool> {
        let mut conn = self.connection().await?;
        let seconds = i64::try_from(seconds).unwrap_or(i64::MAX);
        let applied: bool = conn.expire(key, seconds).await?;
        Ok(applied)
    }

    async fn ttl(&self, key: &str) -> StoreResult<Option<u64>> {
        let mut conn = self.connection().await?;
        // -2: missing, -1: no expiry
        let remaining: i64 = conn.ttl(key).await?;
        Ok(u64::try_from(remaining).ok())
    }

    async fn compare_and_delete(&self, key: &str, expected: &[u8]) -> StoreResult<bool> {
        let mut conn = self.connection().await?;
        let removed: i64 = self
            .compare_and_delete
            .key(key)
            .arg(expected)
            .invoke_async(&mut conn)
            .await?;
        Ok(removed > 0)
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_rejects_bad_url() {
        let result = RedisStore::connect(
            "not a url",
            Duration::from_millis(100),
            Duration::from_millis(100),
        )
        .await;
        assert!(matches!(result, Err(CacheError::Config(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_not_fatal() {
        // Port 1 is reserved and never runs Redis.
        let timeout = Duration::from_millis(200);
        let started = Instant::now();
        let store = RedisStore::connect("redis://127.0.0.1:1", timeout, timeout)
            .await
            .unwrap();
        assert!(started.elapsed() < timeout * 2, "connect stalled");

        let started = Instant::now();
        assert!(store.get("anything").await.is_err());
        assert!(store.ping().await.is_err());
        assert!(started.elapsed() < timeout * 2, "calls stalled");
    }

    #[tokio::test]
    async fn test_reconnect_after_cooldown_stays_bounded() {
        let timeout = Duration::from_millis(200);
        let store = RedisStore::connect("redis://127.0.0.1:1", timeout, timeout)
            .await
            .unwrap();
        assert!(store.cooling_down());

        tokio::time::sleep(RECONNECT_COOLDOWN + Duration::from_millis(50)).await;
        assert!(!store.cooling_down());

        let started = Instant::now();
        assert!(store.exists("k").await.is_err());
        assert!(started.elapsed() < timeout * 2);
        assert!(store.cooling_down(), "failed attempt restarts the cooldown");
    }

    #[tokio::test]
    async fn test_cache_over_unreachable_redis_degrades_quickly() {
        use crate::cache::{Cache, CallArgs};
        use std::sync::Arc;

        let timeout = Duration::from_millis(200);
        let store = RedisStore::connect("redis://127.0.0.1:1", timeout, timeout)
            .await
            .unwrap();
        let cache = Cache::new(Arc::new(store), "app");

        let started = Instant::now();
        assert_eq!(cache.get("k").await, None);
        let value: u32 = cache
            .memoize("p", Some(60))
            .call("f", &CallArgs::new(), || async { 7 })
            .await;
        assert_eq!(value, 7);
        assert!(started.elapsed() < timeout * 2);
    }
}
