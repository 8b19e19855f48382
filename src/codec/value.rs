//! Value encoding for sweep-queue cells (spec §4.1). Follows the teacher's `db_impl_cbor!`
//! convention of storing CBOR-encoded values behind the `Kvc*` traits.

use crate::error::{Result, SweepError};
use crate::types::{Cell, TableRef};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum QueueValue {
    /// A queued write: `(tableRef, cell, isTombstone)`.
    Write { table_ref: TableRef, cell: Cell, is_tombstone: bool },
    /// A pointer entry in a reference row naming one row of a dedicated chain.
    Pointer { dedicated_row_number: u32, num_dedicated_rows: u32 },
}

impl QueueValue {
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_cbor::to_vec(self).map_err(|e| SweepError::corrupt_row(&[], e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_cbor::from_slice(bytes).map_err(|e| SweepError::corrupt_row(bytes, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_write_value() {
        let value = QueueValue::Write {
            table_ref: TableRef::new("tblC"),
            cell: Cell::new(b"rowA".to_vec(), b"colA".to_vec()),
            is_tombstone: false,
        };
        let encoded = value.encode().unwrap();
        assert_eq!(QueueValue::decode(&encoded).unwrap(), value);
    }

    #[test]
    fn round_trips_pointer_value() {
        let value = QueueValue::Pointer { dedicated_row_number: 1, num_dedicated_rows: 3 };
        let encoded = value.encode().unwrap();
        assert_eq!(QueueValue::decode(&encoded).unwrap(), value);
    }
}
