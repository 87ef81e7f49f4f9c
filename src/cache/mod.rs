//! Cache Module
//!
//! Namespaced caching over a `KvStore` with JSON-aware values, TTL expiry and
//! memoization of async computations.

mod fingerprint;
mod memo;
mod service;
mod stats;
mod value;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use fingerprint::{fingerprint, CallArgs};
pub use memo::{LockPolicy, Memoizer};
pub use service::Cache;
pub use stats::{CacheEvent, CacheObserver, CacheStats, StatsSnapshot, StoreOp, TracingObserver};
pub use value::CacheValue;
