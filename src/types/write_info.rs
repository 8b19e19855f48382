use crate::types::{Cell, TableRef};

/// A single transactional write enqueued for sweeping (spec §3 `WriteInfo`).
///
/// Equality and hashing use `(table_ref, cell)` only — `start_ts` is a version, not part
/// of identity — so callers must use [`WriteInfo::identity`] when deduplicating, not `==`
/// directly against entries that may carry different timestamps.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct WriteInfo {
    pub table_ref: TableRef,
    pub cell: Cell,
    pub start_ts: u64,
    pub is_tombstone: bool,
}

impl WriteInfo {
    pub fn new(table_ref: TableRef, cell: Cell, start_ts: u64, is_tombstone: bool) -> Self {
        Self { table_ref, cell, start_ts, is_tombstone }
    }

    /// `(tableRef, cell)` — the part of `WriteInfo` that equality/identity is defined over.
    pub fn identity(&self) -> (&TableRef, &Cell) {
        (&self.table_ref, &self.cell)
    }
}

impl PartialEq for WriteInfo {
    fn eq(&self, other: &Self) -> bool {
        self.table_ref == other.table_ref && self.cell == other.cell
    }
}

impl Eq for WriteInfo {}
