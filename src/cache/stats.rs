//! Cache Statistics Module
//!
//! Cache events, the observer hook that receives them, and the counting and
//! logging observers shipped with the crate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

// == Store Operation ==
/// Store call that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Get,
    Set,
    Delete,
    Exists,
    Expire,
    Ttl,
    Lock,
    Unlock,
}

impl StoreOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreOp::Get => "get",
            StoreOp::Set => "set",
            StoreOp::Delete => "delete",
            StoreOp::Exists => "exists",
            StoreOp::Expire => "expire",
            StoreOp::Ttl => "ttl",
            StoreOp::Lock => "lock",
            StoreOp::Unlock => "unlock",
        }
    }
}

// == Cache Event ==
/// Something the cache did. Keys are namespace-qualified.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEvent<'a> {
    Hit { key: &'a str },
    Miss { key: &'a str },
    Set { key: &'a str, ttl: Option<u64> },
    Delete { key: &'a str, removed: bool },
    /// A store call failed and was swallowed
    StoreError { key: &'a str, op: StoreOp, error: &'a str },
    /// JSON decoding failed and the raw text was returned
    DecodeFallback { key: &'a str },
    /// A memoized function ran on a miss
    Computed { key: &'a str, elapsed: Duration },
    /// Another caller held the compute lock
    LockContended { key: &'a str },
    /// Gave up waiting for the lock holder and computed anyway
    LockWaitTimedOut { key: &'a str },
}

// == Observer Hook ==
/// Receives every cache event. Implementations must be cheap and must not
/// block; they run inline on the calling task.
pub trait CacheObserver: Send + Sync {
    fn on_event(&self, event: &CacheEvent<'_>);
}

/// Logs events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CacheObserver for TracingObserver {
    fn on_event(&self, event: &CacheEvent<'_>) {
        match event {
            CacheEvent::Hit { key } => debug!(key, "cache hit"),
            CacheEvent::Miss { key } => debug!(key, "cache miss"),
            CacheEvent::Set { key, ttl } => debug!(key, ttl = ?ttl, "cache set"),
            CacheEvent::Delete { key, removed } => debug!(key, removed, "cache delete"),
            CacheEvent::StoreError { key, op, error } => {
                warn!(key, op = op.as_str(), error, "cache store error, degrading to miss")
            }
            CacheEvent::DecodeFallback { key } => {
                debug!(key, "stored value is not JSON, returning raw text")
            }
            CacheEvent::Computed { key, elapsed } => {
                info!(key, elapsed_ms = elapsed.as_millis() as u64, "memoized call computed")
            }
            CacheEvent::LockContended { key } => debug!(key, "waiting on compute lock"),
            CacheEvent::LockWaitTimedOut { key } => {
                warn!(key, "compute lock wait timed out, computing without lock")
            }
        }
    }
}

// == Cache Stats ==
/// Lock-free counters fed by cache events.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    store_errors: AtomicU64,
    decode_fallbacks: AtomicU64,
    computations: AtomicU64,
    lock_contentions: AtomicU64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Point-in-time copy of the counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
            decode_fallbacks: self.decode_fallbacks.load(Ordering::Relaxed),
            computations: self.computations.load(Ordering::Relaxed),
            lock_contentions: self.lock_contentions.load(Ordering::Relaxed),
        }
    }
}

impl CacheObserver for CacheStats {
    fn on_event(&self, event: &CacheEvent<'_>) {
        let counter = match event {
            CacheEvent::Hit { .. } => &self.hits,
            CacheEvent::Miss { .. } => &self.misses,
            CacheEvent::Set { .. } => &self.sets,
            CacheEvent::Delete { removed: true, .. } => &self.deletes,
            CacheEvent::Delete { removed: false, .. } => return,
            CacheEvent::StoreError { .. } => &self.store_errors,
            CacheEvent::DecodeFallback { .. } => &self.decode_fallbacks,
            CacheEvent::Computed { .. } => &self.computations,
            CacheEvent::LockContended { .. } => &self.lock_contentions,
            CacheEvent::LockWaitTimedOut { .. } => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

// == Stats Snapshot ==
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub store_errors: u64,
    pub decode_fallbacks: u64,
    pub computations: u64,
    pub lock_contentions: u64,
}

impl StatsSnapshot {
    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
