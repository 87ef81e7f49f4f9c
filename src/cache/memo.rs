//! Memoization Module
//!
//! Wraps an async computation so its result is cached under a fingerprint of
//! the call. On a hit the computation is not run at all.
//!
//! Without a lock policy two concurrent misses on the same fingerprint both
//! compute. With [`Memoizer::with_lock`] the first caller takes a short-lived
//! store lock (`SET NX EX`) and the others wait a bounded time for its result.

use std::convert::Infallible;
use std::future::Future;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::cache::{fingerprint, Cache, CacheEvent, CacheValue, CallArgs, StoreOp};

// == Lock Policy ==
/// Single-flight settings for a memoizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    /// Lock expiry; bounds how long a crashed holder blocks others
    pub lease: Duration,
    /// Longest a contender waits for the holder's result
    pub wait: Duration,
    /// Interval between result checks while waiting
    pub poll: Duration,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            lease: Duration::from_secs(30),
            wait: Duration::from_secs(10),
            poll: Duration::from_millis(50),
        }
    }
}

enum LockOutcome<T> {
    /// This caller holds the lock with the given token
    Acquired(String),
    /// The holder finished while we waited
    Cached(T),
    /// Compute without the lock
    Proceed,
}

// == Memoizer ==
/// Caches results of calls made through it. Obtained from [`Cache::memoize`].
#[derive(Debug, Clone)]
pub struct Memoizer {
    cache: Cache,
    key_prefix: String,
    ttl: Option<u64>,
    lock: Option<LockPolicy>,
}

impl Memoizer {
    pub(crate) fn new(cache: Cache, key_prefix: String, ttl: Option<u64>) -> Self {
        Self {
            cache,
            key_prefix,
            ttl,
            lock: None,
        }
    }

    /// Enables at-most-once computation per fingerprint.
    pub fn with_lock(mut self, policy: LockPolicy) -> Self {
        self.lock = Some(policy);
        self
    }

    /// Logical key (within the cache namespace) a call would be stored under.
    pub fn fingerprint(&self, function: &str, args: &CallArgs) -> String {
        fingerprint::fingerprint(&self.key_prefix, function, args)
    }

    /// Removes the cached result of one call.
    pub async fn invalidate(&self, function: &str, args: &CallArgs) -> bool {
        self.cache.delete(&self.fingerprint(function, args)).await
    }

    // == Call ==
    /// Returns the cached result for `(function, args)`, or runs `compute`
    /// on a miss and caches what it returns.
    ///
    /// Cache failures never surface here; at worst `compute` runs every time.
    pub async fn call<T, F, Fut>(&self, function: &str, args: &CallArgs, compute: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let outcome = self
            .try_call(function, args, || async move {
                Ok::<T, Infallible>(compute().await)
            })
            .await;
        match outcome {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Like [`call`](Self::call) for fallible computations. Errors are
    /// returned as-is and never cached.
    pub async fn try_call<T, E, F, Fut>(
        &self,
        function: &str,
        args: &CallArgs,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = self.cache.qualify(&self.fingerprint(function, args));

        if let Some(hit) = self.cache.fetch_typed::<T>(&key).await {
            self.cache.emit(CacheEvent::Hit { key: &key });
            return Ok(hit);
        }
        self.cache.emit(CacheEvent::Miss { key: &key });

        let token = match self.lock {
            Some(policy) => match self.acquire::<T>(&key, policy).await {
                LockOutcome::Acquired(token) => {
                    // The previous holder may have stored between our miss and the lock
                    if let Some(hit) = self.cache.fetch_typed::<T>(&key).await {
                        self.release(&key, &token).await;
                        self.cache.emit(CacheEvent::Hit { key: &key });
                        return Ok(hit);
                    }
                    Some(token)
                }
                LockOutcome::Cached(value) => {
                    self.cache.emit(CacheEvent::Hit { key: &key });
                    return Ok(value);
                }
                LockOutcome::Proceed => None,
            },
            None => None,
        };

        let started = Instant::now();
        let result = compute().await;

        if let Ok(value) = &result {
            self.cache.emit(CacheEvent::Computed {
                key: &key,
                elapsed: started.elapsed(),
            });
            self.store(&key, value).await;
        }

        if let Some(token) = token {
            self.release(&key, &token).await;
        }

        result
    }

    async fn store<T: Serialize>(&self, key: &str, value: &T) {
        if self.ttl == Some(0) {
            tracing::warn!(key, "memoizer has a zero TTL, result not cached");
            return;
        }
        let encoded = match CacheValue::json(value) {
            Ok(encoded) => encoded.encode(),
            Err(err) => {
                tracing::warn!(key, error = %err, "memoized result is not serializable, not caching");
                return;
            }
        };

        let store = self.cache.store();
        let outcome = match self.ttl {
            Some(seconds) => store.set_ex(key, seconds, &encoded).await,
            None => store.set(key, &encoded).await,
        };
        match outcome {
            Ok(true) => self.cache.emit(CacheEvent::Set { key, ttl: self.ttl }),
            Ok(false) => tracing::debug!(key, "store declined memoized result"),
            Err(err) => self.cache.store_failed(key, StoreOp::Set, &err),
        }
    }

    // == Lock ==

    fn lock_key(key: &str) -> String {
        format!("{}:lock", key)
    }

    async fn acquire<T: DeserializeOwned>(&self, key: &str, policy: LockPolicy) -> LockOutcome<T> {
        let lock_key = Self::lock_key(key);
        let token = Uuid::new_v4().to_string();
        let lease = policy.lease.as_secs().max(1);
        let store = self.cache.store();

        match store.set_nx_ex(&lock_key, lease, token.as_bytes()).await {
            Ok(true) => return LockOutcome::Acquired(token),
            Ok(false) => self.cache.emit(CacheEvent::LockContended { key }),
            Err(err) => {
                self.cache.store_failed(&lock_key, StoreOp::Lock, &err);
                return LockOutcome::Proceed;
            }
        }

        let deadline = Instant::now() + policy.wait;
        while Instant::now() < deadline {
            tokio::time::sleep(policy.poll).await;

            if let Some(value) = self.cache.fetch_typed::<T>(key).await {
                return LockOutcome::Cached(value);
            }

            // Holder gave up (error or lease expiry) without storing a result
            match store.set_nx_ex(&lock_key, lease, token.as_bytes()).await {
                Ok(true) => return LockOutcome::Acquired(token),
                Ok(false) => {}
                Err(err) => {
                    self.cache.store_failed(&lock_key, StoreOp::Lock, &err);
                    return LockOutcome::Proceed;
                }
            }
        }

        self.cache.emit(CacheEvent::LockWaitTimedOut { key });
        LockOutcome::Proceed
    }

    async fn release(&self, key: &str, token: &str) {
        let lock_key = Self::lock_key(key);
        if let Err(err) = self
            .cache
            .store()
            .compare_and_delete(&lock_key, token.as_bytes())
            .await
        {
            self.cache.store_failed(&lock_key, StoreOp::Unlock, &err);
        }
    }
}
