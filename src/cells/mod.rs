//! `SweepableCells`: the sweep queue's cell table (spec §1). Wires the key codec,
//! partitioner, and the external `KeyValueStore` / `TransactionTable` / `ShardCountProvider`
//! collaborators into the enqueue, read, and cleanup paths.
//!
//! Grounded on the teacher's `ShardStateDb` (`shardstate_db.rs`), which likewise composes
//! several `Kvc*`-trait-object fields plus a sibling db into one subsystem struct.

mod cleanup;
mod common;
mod enqueue;
mod read;

use std::sync::Arc;

use crate::db::traits::KeyValueStore;
use crate::metrics::Metrics;
use crate::shard_count::ShardCountProvider;
use crate::txn_table::TransactionTable;

pub struct SweepableCells {
    pub(crate) store: Arc<dyn KeyValueStore>,
    pub(crate) txn_table: Arc<dyn TransactionTable>,
    pub(crate) shard_count: Arc<dyn ShardCountProvider>,
    pub(crate) metrics: Metrics,
}

impl SweepableCells {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        txn_table: Arc<dyn TransactionTable>,
        shard_count: Arc<dyn ShardCountProvider>,
    ) -> Self {
        Self { store, txn_table, shard_count, metrics: Metrics::new() }
    }
}
