use crate::error::Result;
use crate::types::{Cell, TableRef};

/// Names the table an operation targets (spec §6: the KVS interface is generic over table).
#[derive(Debug, Clone, Copy)]
pub enum Table<'a> {
    /// The sweep-queue cell table this crate owns (rows per spec §3).
    SweepQueue,
    /// A user table, named by the caller's `TableRef`; only reached via `delete_versions`.
    User(&'a TableRef),
}

/// A half-open `[start, end)` byte range over row keys.
#[derive(Debug, Clone)]
pub struct RowRange {
    pub start: Vec<u8>,
    pub end: Vec<u8>,
}

impl RowRange {
    pub fn new(start: Vec<u8>, end: Vec<u8>) -> Self {
        Self { start, end }
    }
}

/// One row returned by a [`KeyValueStore::scan`]: its key, and its columns in ascending order.
#[derive(Debug, Clone, Default)]
pub struct QueueRow {
    pub row_key: Vec<u8>,
    pub columns: Vec<(Vec<u8>, Vec<u8>)>,
}

/// One `(row_key, column_key, value)` write passed to [`KeyValueStore::put_many`].
#[derive(Debug, Clone)]
pub struct QueueCell {
    pub row_key: Vec<u8>,
    pub column_key: Vec<u8>,
    pub value: Vec<u8>,
}

/// The KVS surface the sweep queue core consumes (spec §6), generalized from the teacher's
/// `Kvc`/`KvcReadable`/`KvcWriteable` hierarchy (`db/traits/mod.rs`) from single-value
/// get/put to ordered row/column range scans, since the sweep queue needs whole rows of
/// many columns rather than one opaque value per key.
pub trait KeyValueStore: Send + Sync {
    /// Rows with `row_key` in `range.start..range.end`, ascending by row key, each with its
    /// columns ascending by column key.
    fn scan(&self, table: Table, range: &RowRange) -> Result<Vec<QueueRow>>;

    /// Writes or overwrites `cells`. Concurrent callers never target the same
    /// `(row_key, column_key)` thanks to the `writeIndex`/`dedicatedRowNumber` isolation of
    /// spec §4.3, so this need not be atomic across `cells`.
    fn put_many(&self, table: Table, cells: &[QueueCell]) -> Result<()>;

    /// Deletes every row with `row_key` in `range.start..range.end`. Idempotent.
    fn delete_range(&self, table: Table, range: &RowRange) -> Result<()>;

    /// Version-precise delete of `(cell, start_ts)` pairs from a user table (spec §4.4.7).
    fn delete_versions(&self, table: Table, versions: &[(Cell, u64)]) -> Result<()>;
}
