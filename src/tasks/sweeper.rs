//! TTL Sweeper Task
//!
//! Redis expires keys itself. The memory backend only drops an expired entry
//! when that key is touched again, so keys written once and never read
//! would stay in the map forever. The sweeper reclaims them.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::backend::MemoryStore;

/// Purges expired entries from `store` once and logs the result.
///
/// Returns the number of entries removed.
pub async fn sweep_once(store: &MemoryStore) -> usize {
    let removed = store.purge_expired().await;
    if removed > 0 {
        let remaining = store.len().await;
        info!(removed, remaining, "memory store: purged expired keys");
    } else {
        debug!("memory store: nothing expired");
    }
    removed
}

/// Runs [`sweep_once`] every `interval_secs` seconds (at least 1) until the
/// returned handle is aborted.
///
/// A sweep that overruns its slot delays the next one rather than bunching
/// sweeps together.
pub fn spawn_sweeper_task(store: Arc<MemoryStore>, interval_secs: u64) -> JoinHandle<()> {
    let period = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(period_secs = period.as_secs(), "memory store sweeper running");

        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            sweep_once(&store).await;
        }
    })
}
