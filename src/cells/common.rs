//! Helpers shared by the read and cleanup paths: fetching a single row by key, and
//! decoding a reference row's columns into typed entries.

use crate::codec::{ColumnEntryKind, ColumnKey, QueueValue, RowKey};
use crate::config::fine_partition_start;
use crate::db::traits::{KeyValueStore, QueueRow, RowRange, Table};
use crate::error::Result;
use crate::types::WriteInfo;

pub(crate) enum ReferenceEntry {
    Cell { start_ts: u64, write: WriteInfo },
    Pointer { start_ts: u64, dedicated_row_number: u32, num_dedicated_rows: u32 },
}

/// Fetches the single row named by `row_key` (a reference or dedicated row), if present.
pub(crate) fn fetch_row(store: &dyn KeyValueStore, row_key: &RowKey) -> Result<Option<QueueRow>> {
    let encoded = row_key.encode()?;
    let end = row_key.next_lexicographic()?;
    let mut rows = store.scan(Table::SweepQueue, &RowRange::new(encoded, end))?;
    Ok(rows.pop())
}

/// Decodes every column of a reference row into [`ReferenceEntry`]s, in ascending column
/// order (spec §4.4.2, §4.4.3).
pub(crate) fn decode_reference_row(row: &QueueRow, fine_partition: u64) -> Result<Vec<ReferenceEntry>> {
    let partition_start = fine_partition_start(fine_partition);
    let mut out = Vec::with_capacity(row.columns.len());
    for (column_key_bytes, value_bytes) in &row.columns {
        let column_key = ColumnKey::decode(column_key_bytes)?;
        let start_ts = partition_start + column_key.timestamp_offset;
        match column_key.kind {
            ColumnEntryKind::Cell { .. } => {
                let value = QueueValue::decode(value_bytes)?;
                match value {
                    QueueValue::Write { table_ref, cell, is_tombstone } => {
                        out.push(ReferenceEntry::Cell {
                            start_ts,
                            write: WriteInfo::new(table_ref, cell, start_ts, is_tombstone),
                        });
                    }
                    QueueValue::Pointer { .. } => {
                        return Err(crate::error::SweepError::corrupt_row(
                            column_key_bytes,
                            "pointer value stored under a non-pointer column key",
                        ));
                    }
                }
            }
            ColumnEntryKind::Pointer { dedicated_row_number } => {
                let value = QueueValue::decode(value_bytes)?;
                match value {
                    QueueValue::Pointer { dedicated_row_number: from_value, num_dedicated_rows } => {
                        debug_assert_eq!(dedicated_row_number, from_value);
                        out.push(ReferenceEntry::Pointer { start_ts, dedicated_row_number, num_dedicated_rows });
                    }
                    QueueValue::Write { .. } => {
                        return Err(crate::error::SweepError::corrupt_row(
                            column_key_bytes,
                            "write value stored under a pointer column key",
                        ));
                    }
                }
            }
        }
    }
    Ok(out)
}

/// Decodes every column of a dedicated row (all cells belong to the row's anchor `startTs`).
pub(crate) fn decode_dedicated_row(row: &QueueRow, anchor_ts: u64) -> Result<Vec<WriteInfo>> {
    let mut out = Vec::with_capacity(row.columns.len());
    for (column_key_bytes, value_bytes) in &row.columns {
        let _column_key = ColumnKey::decode(column_key_bytes)?;
        match QueueValue::decode(value_bytes)? {
            QueueValue::Write { table_ref, cell, is_tombstone } => {
                out.push(WriteInfo::new(table_ref, cell, anchor_ts, is_tombstone));
            }
            QueueValue::Pointer { .. } => {
                return Err(crate::error::SweepError::corrupt_row(
                    column_key_bytes,
                    "pointer entry found inside a dedicated row",
                ));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::traits::QueueRow;
    use crate::error::SweepError;

    fn corrupt_reason(err: failure::Error) -> String {
        match err.downcast::<SweepError>().expect("a SweepError") {
            SweepError::CorruptRow { reason, .. } => reason,
            other => panic!("expected CorruptRow, got {:?}", other),
        }
    }

    #[test]
    fn decode_reference_row_rejects_pointer_value_under_cell_key() {
        let column_key = ColumnKey::cell(0, 0).encode().unwrap().to_vec();
        let value = QueueValue::Pointer { dedicated_row_number: 0, num_dedicated_rows: 1 }.encode().unwrap();
        let row = QueueRow { row_key: vec![], columns: vec![(column_key, value)] };

        let err = decode_reference_row(&row, 0).unwrap_err();
        assert_eq!(corrupt_reason(err), "pointer value stored under a non-pointer column key");
    }

    #[test]
    fn decode_reference_row_rejects_write_value_under_pointer_key() {
        let column_key = ColumnKey::pointer(0, 0).encode().unwrap().to_vec();
        let value = QueueValue::Write {
            table_ref: crate::types::TableRef::new("tblC"),
            cell: crate::types::Cell::new(b"row".to_vec(), b"col".to_vec()),
            is_tombstone: false,
        }
        .encode()
        .unwrap();
        let row = QueueRow { row_key: vec![], columns: vec![(column_key, value)] };

        let err = decode_reference_row(&row, 0).unwrap_err();
        assert_eq!(corrupt_reason(err), "write value stored under a pointer column key");
    }

    #[test]
    fn decode_dedicated_row_rejects_pointer_entries() {
        let column_key = ColumnKey::cell(0, 0).encode().unwrap().to_vec();
        let value = QueueValue::Pointer { dedicated_row_number: 0, num_dedicated_rows: 1 }.encode().unwrap();
        let row = QueueRow { row_key: vec![], columns: vec![(column_key, value)] };

        let err = decode_dedicated_row(&row, 1000).unwrap_err();
        assert_eq!(corrupt_reason(err), "pointer entry found inside a dedicated row");
    }
}
