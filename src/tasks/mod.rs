//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - TTL Sweeper: Purges expired entries from the memory store

mod sweeper;

pub use sweeper::{spawn_sweeper_task, sweep_once};
