//! RocksDB-backed [`KeyValueStore`], grounded on the teacher's direct `rocksdb` dependency
//! and its per-table column-family split (`shardstate_db.rs` opens one CF per logical
//! table). `scan` copies each value out to an owned `Vec<u8>` rather than returning the
//! pinned slice `rocksdb::DB::get_pinned_cf` hands back, since a [`QueueRow`] holds many
//! columns collected across an iterator rather than one pinned read at a time.
//!
//! Column families: `sweep_queue` holds the cell table's rows, keyed by
//! `row_key ‖ column_key` (both fixed-width, so a row's columns are exactly the keys sharing
//! its `ROW_KEY_LEN`-byte prefix). `user_cells` is a stand-in for the real KVS's user tables,
//! which in production live outside this crate; wiring `delete_versions` against the actual
//! KVS client is the caller's job once this crate is embedded in the larger system.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{ColumnFamilyDescriptor, Direction, IteratorMode, Options, DB};

use crate::codec::ROW_KEY_LEN;
use crate::db::traits::{KeyValueStore, QueueCell, QueueRow, RowRange, Table};
use crate::error::{Result, SweepError};
use crate::types::Cell;

const CF_SWEEP_QUEUE: &str = "sweep_queue";
const CF_USER_CELLS: &str = "user_cells";

pub struct RocksDbKeyValueStore {
    db: Arc<DB>,
}

impl RocksDbKeyValueStore {
    pub fn with_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cfs = vec![
            ColumnFamilyDescriptor::new(CF_SWEEP_QUEUE, Options::default()),
            ColumnFamilyDescriptor::new(CF_USER_CELLS, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cfs)
            .map_err(|e| failure::format_err!("failed to open sweep queue rocksdb: {}", e))?;

        Ok(Self { db: Arc::new(db) })
    }

    fn sweep_queue_cf(&self) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(CF_SWEEP_QUEUE)
            .ok_or_else(|| failure::format_err!("column family {} missing", CF_SWEEP_QUEUE))
    }

    fn user_cells_cf(&self) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(CF_USER_CELLS)
            .ok_or_else(|| failure::format_err!("column family {} missing", CF_USER_CELLS))
    }

    fn user_cell_key(table_name: &str, cell: &Cell, start_ts: u64) -> Vec<u8> {
        let mut buf = Vec::with_capacity(table_name.len() + cell.row.len() + cell.column.len() + 16);
        buf.extend_from_slice(&(table_name.len() as u32).to_be_bytes());
        buf.extend_from_slice(table_name.as_bytes());
        buf.extend_from_slice(&cell.identity_bytes());
        buf.extend_from_slice(&start_ts.to_be_bytes());
        buf
    }
}

impl KeyValueStore for RocksDbKeyValueStore {
    fn scan(&self, table: Table, range: &RowRange) -> Result<Vec<QueueRow>> {
        debug_assert!(matches!(table, Table::SweepQueue));
        let cf = self.sweep_queue_cf()?;
        let mut rows: Vec<QueueRow> = Vec::new();

        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&range.start, Direction::Forward));
        for item in iter {
            let (key, value) = item.map_err(|e| failure::format_err!("rocksdb scan failed: {}", e))?;
            if key.as_ref() >= range.end.as_slice() {
                break;
            }
            if key.len() < ROW_KEY_LEN {
                return Err(SweepError::corrupt_row(&key, "key shorter than a row key"));
            }
            let (row_key, column_key) = key.split_at(ROW_KEY_LEN);
            match rows.last_mut() {
                Some(last) if last.row_key == row_key => {
                    last.columns.push((column_key.to_vec(), value.to_vec()));
                }
                _ => rows.push(QueueRow {
                    row_key: row_key.to_vec(),
                    columns: vec![(column_key.to_vec(), value.to_vec())],
                }),
            }
        }
        Ok(rows)
    }

    fn put_many(&self, table: Table, cells: &[QueueCell]) -> Result<()> {
        debug_assert!(matches!(table, Table::SweepQueue));
        let cf = self.sweep_queue_cf()?;
        let mut batch = rocksdb::WriteBatch::default();
        for cell in cells {
            let mut key = Vec::with_capacity(cell.row_key.len() + cell.column_key.len());
            key.extend_from_slice(&cell.row_key);
            key.extend_from_slice(&cell.column_key);
            batch.put_cf(cf, key, &cell.value);
        }
        self.db.write(batch).map_err(|e| failure::format_err!("rocksdb write failed: {}", e))
    }

    fn delete_range(&self, table: Table, range: &RowRange) -> Result<()> {
        debug_assert!(matches!(table, Table::SweepQueue));
        let cf = self.sweep_queue_cf()?;
        let mut batch = rocksdb::WriteBatch::default();
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&range.start, Direction::Forward));
        for item in iter {
            let (key, _) = item.map_err(|e| failure::format_err!("rocksdb scan failed: {}", e))?;
            if key.as_ref() >= range.end.as_slice() {
                break;
            }
            batch.delete_cf(cf, key);
        }
        self.db.write(batch).map_err(|e| failure::format_err!("rocksdb delete failed: {}", e))
    }

    fn delete_versions(&self, table: Table, versions: &[(Cell, u64)]) -> Result<()> {
        let table_name = match table {
            Table::User(table_ref) => table_ref.as_str().to_string(),
            Table::SweepQueue => {
                return Err(failure::format_err!("delete_versions is only valid against user tables"));
            }
        };
        let cf = self.user_cells_cf()?;
        let mut batch = rocksdb::WriteBatch::default();
        for (cell, start_ts) in versions {
            batch.delete_cf(cf, Self::user_cell_key(&table_name, cell, *start_ts));
        }
        self.db.write(batch).map_err(|e| failure::format_err!("rocksdb delete failed: {}", e))
    }
}
