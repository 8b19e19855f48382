//! Column-key codec for the sweep-queue cell table (spec §4.1).
//!
//! Layout: `timestampOffsetWithinPartition(u40, 5 bytes) ‖ writeIndex(u24, 3 bytes)`.
//! Pointer entries reuse the `writeIndex` field with its top bit set (SPEC_FULL.md §3.1).

use crate::error::{Result, SweepError};

pub const COLUMN_KEY_LEN: usize = 5 + 3;

/// `writeIndex` values `0x000000..=0x7FFFFF` are ordinary per-transaction cell indices;
/// `0x800000..=0xFFFFFF` (top bit set) name a pointer entry, with the low 23 bits holding
/// the dedicated row number it points at.
const POINTER_BIT: u32 = 0x800000;
const WRITE_INDEX_MASK: u32 = 0x7FFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColumnEntryKind {
    /// Ordinary queue cell; `write_index` disambiguates cells of the same transaction.
    Cell { write_index: u32 },
    /// Pointer to dedicated row `dedicated_row_number` of the anchor transaction's chain.
    Pointer { dedicated_row_number: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnKey {
    pub timestamp_offset: u64,
    pub kind: ColumnEntryKind,
}

impl ColumnKey {
    pub fn cell(timestamp_offset: u64, write_index: u32) -> Self {
        Self { timestamp_offset, kind: ColumnEntryKind::Cell { write_index } }
    }

    pub fn pointer(timestamp_offset: u64, dedicated_row_number: u32) -> Self {
        Self { timestamp_offset, kind: ColumnEntryKind::Pointer { dedicated_row_number } }
    }

    fn write_index_bits(&self) -> Result<u32> {
        let raw = match self.kind {
            ColumnEntryKind::Cell { write_index } => {
                if write_index & !WRITE_INDEX_MASK != 0 {
                    return Err(SweepError::invalid_argument(format!(
                        "write_index {} exceeds {} bits",
                        write_index, 23
                    )));
                }
                write_index
            }
            ColumnEntryKind::Pointer { dedicated_row_number } => {
                if dedicated_row_number & !WRITE_INDEX_MASK != 0 {
                    return Err(SweepError::invalid_argument(format!(
                        "dedicated_row_number {} exceeds {} bits",
                        dedicated_row_number, 23
                    )));
                }
                POINTER_BIT | dedicated_row_number
            }
        };
        Ok(raw)
    }

    pub fn encode(&self) -> Result<[u8; COLUMN_KEY_LEN]> {
        const MAX_OFFSET: u64 = (1u64 << 40) - 1;
        if self.timestamp_offset > MAX_OFFSET {
            return Err(SweepError::invalid_argument(format!(
                "timestamp_offset {} exceeds u40 range",
                self.timestamp_offset
            )));
        }
        let write_index = self.write_index_bits()?;
        let mut buf = [0u8; COLUMN_KEY_LEN];
        let ts = self.timestamp_offset;
        buf[0] = (ts >> 32) as u8;
        buf[1] = (ts >> 24) as u8;
        buf[2] = (ts >> 16) as u8;
        buf[3] = (ts >> 8) as u8;
        buf[4] = ts as u8;
        buf[5] = (write_index >> 16) as u8;
        buf[6] = (write_index >> 8) as u8;
        buf[7] = write_index as u8;
        Ok(buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != COLUMN_KEY_LEN {
            return Err(SweepError::corrupt_row(
                bytes,
                format!("column key must be {} bytes, got {}", COLUMN_KEY_LEN, bytes.len()),
            ));
        }
        let timestamp_offset = ((bytes[0] as u64) << 32)
            | ((bytes[1] as u64) << 24)
            | ((bytes[2] as u64) << 16)
            | ((bytes[3] as u64) << 8)
            | (bytes[4] as u64);
        let write_index_raw =
            ((bytes[5] as u32) << 16) | ((bytes[6] as u32) << 8) | (bytes[7] as u32);
        let kind = if write_index_raw & POINTER_BIT != 0 {
            ColumnEntryKind::Pointer { dedicated_row_number: write_index_raw & WRITE_INDEX_MASK }
        } else {
            ColumnEntryKind::Cell { write_index: write_index_raw }
        };
        Ok(Self { timestamp_offset, kind })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_cell_column_key() {
        let key = ColumnKey::cell(123, 4);
        let encoded = key.encode().unwrap();
        assert_eq!(ColumnKey::decode(&encoded).unwrap(), key);
    }

    #[test]
    fn round_trips_pointer_column_key() {
        let key = ColumnKey::pointer(500, 2);
        let encoded = key.encode().unwrap();
        let decoded = ColumnKey::decode(&encoded).unwrap();
        assert_eq!(decoded, key);
        assert!(matches!(decoded.kind, ColumnEntryKind::Pointer { dedicated_row_number: 2 }));
    }

    #[test]
    fn ascending_write_index_orders_columns_ascending() {
        let a = ColumnKey::cell(10, 0).encode().unwrap();
        let b = ColumnKey::cell(10, 1).encode().unwrap();
        assert!(a < b);
    }

    #[test]
    fn pointer_and_cell_keyspaces_never_collide() {
        let cell = ColumnKey::cell(10, 5).encode().unwrap();
        let pointer = ColumnKey::pointer(10, 5).encode().unwrap();
        assert_ne!(cell, pointer);
    }
}
