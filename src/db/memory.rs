//! In-memory [`KeyValueStore`], grounded on the teacher's (referenced but not retrieved)
//! `MemoryDb` — inferred from `macros.rs`'s `base_impl!`, which constructs one via
//! `MemoryDb::new()` as the in-memory counterpart to the RocksDB-backed store. Used by this
//! crate's own test suite and by callers embedding the sweep queue in unit tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::RwLock;

use crate::db::traits::{KeyValueStore, QueueCell, QueueRow, RowRange, Table};
use crate::error::Result;
use crate::types::{Cell, TableRef};

#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    queue_rows: RwLock<BTreeMap<Vec<u8>, BTreeMap<Vec<u8>, Vec<u8>>>>,
    live_user_cells: RwLock<HashSet<(TableRef, Cell, u64)>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test helper: seeds a user-table version so a later [`KeyValueStore::delete_versions`]
    /// call has something to remove and [`Self::user_cell_exists`] has something to observe.
    pub fn seed_user_cell(&self, table_ref: TableRef, cell: Cell, start_ts: u64) {
        self.live_user_cells.write().unwrap().insert((table_ref, cell, start_ts));
    }

    pub fn user_cell_exists(&self, table_ref: &TableRef, cell: &Cell, start_ts: u64) -> bool {
        self.live_user_cells.read().unwrap().contains(&(table_ref.clone(), cell.clone(), start_ts))
    }

    pub fn queue_row_count(&self) -> usize {
        self.queue_rows.read().unwrap().len()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn scan(&self, table: Table, range: &RowRange) -> Result<Vec<QueueRow>> {
        debug_assert!(matches!(table, Table::SweepQueue));
        let rows = self.queue_rows.read().unwrap();
        let mut out = Vec::new();
        for (row_key, columns) in rows.range(range.start.clone()..range.end.clone()) {
            out.push(QueueRow {
                row_key: row_key.clone(),
                columns: columns.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            });
        }
        Ok(out)
    }

    fn put_many(&self, table: Table, cells: &[QueueCell]) -> Result<()> {
        debug_assert!(matches!(table, Table::SweepQueue));
        let mut rows = self.queue_rows.write().unwrap();
        for cell in cells {
            rows.entry(cell.row_key.clone())
                .or_insert_with(BTreeMap::new)
                .insert(cell.column_key.clone(), cell.value.clone());
        }
        Ok(())
    }

    fn delete_range(&self, table: Table, range: &RowRange) -> Result<()> {
        debug_assert!(matches!(table, Table::SweepQueue));
        let mut rows = self.queue_rows.write().unwrap();
        let keys: Vec<Vec<u8>> = rows.range(range.start.clone()..range.end.clone()).map(|(k, _)| k.clone()).collect();
        for key in keys {
            rows.remove(&key);
        }
        Ok(())
    }

    fn delete_versions(&self, table: Table, versions: &[(Cell, u64)]) -> Result<()> {
        let table_ref = match table {
            Table::User(table_ref) => table_ref.clone(),
            Table::SweepQueue => {
                debug_assert!(false, "delete_versions is only ever called against user tables");
                return Ok(());
            }
        };
        let mut live = self.live_user_cells.write().unwrap();
        for (cell, start_ts) in versions {
            live.remove(&(table_ref.clone(), cell.clone(), *start_ts));
        }
        Ok(())
    }
}
