//! The shard count provider: a minimal stand-in for the (out-of-scope, spec §1) shard-progress
//! table's sentinel `-1` cell, from which the real system's persisted `numShards` is read
//! (spec §9 "Mutable global `numShards`"). `enqueue` reads this once per call so a concurrent
//! resize can never split one call across two shard counts.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::config::DEFAULT_SHARDS;
use crate::error::Result;

pub trait ShardCountProvider: Send + Sync {
    /// `currentNumShards()`.
    fn current_num_shards(&self) -> Result<u32>;
}

/// Test double / default standalone configuration: a shard count fixed for the process
/// lifetime (or updated out-of-band by the caller via [`FixedShardCount::set`]).
#[derive(Debug)]
pub struct FixedShardCount {
    num_shards: AtomicU32,
}

impl Default for FixedShardCount {
    fn default() -> Self {
        Self::new(DEFAULT_SHARDS)
    }
}

impl FixedShardCount {
    pub fn new(num_shards: u32) -> Self {
        Self { num_shards: AtomicU32::new(num_shards) }
    }

    pub fn set(&self, num_shards: u32) {
        self.num_shards.store(num_shards, Ordering::SeqCst);
    }
}

impl ShardCountProvider for FixedShardCount {
    fn current_num_shards(&self) -> Result<u32> {
        Ok(self.num_shards.load(Ordering::SeqCst))
    }
}
