//! Metrics hooks (spec §4.4.10, §2 component 6). The teacher never wires up a metrics
//! crate; the `prometheus` + `lazy_static!` idiom is adopted from `aptos-labs-aptos-core`,
//! using the `lazy_static` dependency the teacher already carries.

use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};

lazy_static! {
    static ref ENQUEUED_WRITES: IntCounterVec = register_int_counter_vec!(
        "sweep_queue_enqueued_writes_total",
        "Writes appended to the sweep queue, by strategy",
        &["strategy"]
    )
    .expect("sweep_queue_enqueued_writes_total metric registration");
    static ref ENTRIES_READ: IntCounterVec = register_int_counter_vec!(
        "sweep_queue_entries_read_total",
        "Raw queue entries touched by a read, pre latest-per-cell reduction, by strategy",
        &["strategy"]
    )
    .expect("sweep_queue_entries_read_total metric registration");
    static ref ABORTED_WRITES_DELETED: IntCounterVec = register_int_counter_vec!(
        "sweep_queue_aborted_writes_deleted_total",
        "User-table versions deleted because their transaction was aborted, by strategy",
        &["strategy"]
    )
    .expect("sweep_queue_aborted_writes_deleted_total metric registration");
}

/// Thin wrapper so call sites pass a [`crate::config::SweepStrategy`] rather than a string.
#[derive(Debug, Default, Clone, Copy)]
pub struct Metrics;

impl Metrics {
    pub fn new() -> Self {
        Self
    }

    pub fn inc_enqueued_writes(&self, strategy: crate::config::SweepStrategy, n: u64) {
        ENQUEUED_WRITES.with_label_values(&[strategy.as_label()]).inc_by(n);
    }

    pub fn inc_entries_read(&self, strategy: crate::config::SweepStrategy, n: u64) {
        ENTRIES_READ.with_label_values(&[strategy.as_label()]).inc_by(n);
    }

    pub fn inc_aborted_writes_deleted(&self, strategy: crate::config::SweepStrategy, n: u64) {
        ABORTED_WRITES_DELETED.with_label_values(&[strategy.as_label()]).inc_by(n);
    }
}
