//! Memo Cache - A namespaced, memoizing cache service
//!
//! Wraps a key-value store (Redis or in-memory) with namespacing, JSON-aware
//! values, TTL expiry and memoization of async computations. Store failures
//! degrade to cache misses instead of errors.

pub mod api;
pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use backend::{connect, KvStore, MemoryStore, RedisStore};
pub use cache::{Cache, CacheValue, CallArgs, LockPolicy, Memoizer};
pub use config::Config;
pub use error::{CacheError, Result, StoreError};
pub use tasks::spawn_sweeper_task;
