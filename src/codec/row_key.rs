//! Row-key codec for the sweep-queue cell table (spec §4.1, bit layout fixed in SPEC_FULL.md §3.1).
//!
//! Layout: `bigEndian(u64: finePartition-or-anchorTs) ‖ metadata(9 bytes)`, metadata =
//! `flags(1) ‖ shard(u24, 3 bytes) ‖ dedicatedRowNumber(u40, 5 bytes)`.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

use crate::config::{SweepStrategy, MAX_SHARDS};
use crate::error::{Result, SweepError};

const FLAG_CONSERVATIVE: u8 = 1 << 0;
const FLAG_DEDICATED: u8 = 1 << 1;

pub const METADATA_LEN: usize = 1 + 3 + 5;
pub const ROW_KEY_LEN: usize = 8 + METADATA_LEN;

/// The fixed-length suffix of a row key: strategy, dedicated flag, shard, dedicated row number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowMetadata {
    pub strategy: SweepStrategy,
    pub dedicated: bool,
    pub shard: u32,
    pub dedicated_row_number: u32,
}

impl RowMetadata {
    pub fn reference(strategy: SweepStrategy, shard: u32) -> Self {
        Self { strategy, dedicated: false, shard, dedicated_row_number: 0 }
    }

    pub fn dedicated(strategy: SweepStrategy, shard: u32, dedicated_row_number: u32) -> Self {
        Self { strategy, dedicated: true, shard, dedicated_row_number }
    }

    /// `persistToBytes` (spec §4.1): a pure function, lossless round trip with [`Self::hydrate_from_bytes`].
    pub fn persist_to_bytes(&self) -> Result<[u8; METADATA_LEN]> {
        if self.shard >= MAX_SHARDS {
            return Err(SweepError::invalid_argument(format!(
                "shard {} exceeds MAX_SHARDS {}",
                self.shard, MAX_SHARDS
            )));
        }
        let mut buf = [0u8; METADATA_LEN];
        let mut flags = 0u8;
        if self.strategy.is_conservative() {
            flags |= FLAG_CONSERVATIVE;
        }
        if self.dedicated {
            flags |= FLAG_DEDICATED;
        }
        buf[0] = flags;
        buf[1] = (self.shard >> 16) as u8;
        buf[2] = (self.shard >> 8) as u8;
        buf[3] = self.shard as u8;
        let k = self.dedicated_row_number as u64;
        buf[4] = (k >> 32) as u8;
        buf[5] = (k >> 24) as u8;
        buf[6] = (k >> 16) as u8;
        buf[7] = (k >> 8) as u8;
        buf[8] = k as u8;
        Ok(buf)
    }

    /// `hydrateFromBytes` (spec §4.1).
    pub fn hydrate_from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != METADATA_LEN {
            return Err(SweepError::corrupt_row(
                bytes,
                format!("metadata must be {} bytes, got {}", METADATA_LEN, bytes.len()),
            ));
        }
        let flags = bytes[0];
        let strategy = if flags & FLAG_CONSERVATIVE != 0 {
            SweepStrategy::Conservative
        } else {
            SweepStrategy::Thorough
        };
        let dedicated = flags & FLAG_DEDICATED != 0;
        let shard = ((bytes[1] as u32) << 16) | ((bytes[2] as u32) << 8) | (bytes[3] as u32);
        let dedicated_row_number = ((bytes[4] as u64) << 32)
            | ((bytes[5] as u64) << 24)
            | ((bytes[6] as u64) << 16)
            | ((bytes[7] as u64) << 8)
            | (bytes[8] as u64);
        Ok(Self { strategy, dedicated, shard, dedicated_row_number: dedicated_row_number as u32 })
    }
}

/// A full row key: `(finePartition, metadata)` for a reference row, or `(anchorTs, metadata)`
/// for a dedicated row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowKey {
    pub partition_or_anchor: u64,
    pub metadata: RowMetadata,
}

impl RowKey {
    pub fn reference(fine_partition: u64, strategy: SweepStrategy, shard: u32) -> Self {
        Self { partition_or_anchor: fine_partition, metadata: RowMetadata::reference(strategy, shard) }
    }

    pub fn dedicated(anchor_ts: u64, strategy: SweepStrategy, shard: u32, dedicated_row_number: u32) -> Self {
        Self {
            partition_or_anchor: anchor_ts,
            metadata: RowMetadata::dedicated(strategy, shard, dedicated_row_number),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(ROW_KEY_LEN);
        buf.write_u64::<BigEndian>(self.partition_or_anchor)
            .map_err(|e| SweepError::corrupt_row(&[], e.to_string()))?;
        buf.extend_from_slice(&self.metadata.persist_to_bytes()?);
        Ok(buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != ROW_KEY_LEN {
            return Err(SweepError::corrupt_row(
                bytes,
                format!("row key must be {} bytes, got {}", ROW_KEY_LEN, bytes.len()),
            ));
        }
        let mut cursor = Cursor::new(&bytes[0..8]);
        let partition_or_anchor = cursor
            .read_u64::<BigEndian>()
            .map_err(|e| SweepError::corrupt_row(bytes, e.to_string()))?;
        let metadata = RowMetadata::hydrate_from_bytes(&bytes[8..])?;
        Ok(Self { partition_or_anchor, metadata })
    }

    /// The lexicographically smallest byte string not a prefix of, and greater than, any
    /// encoding of this key — the exclusive end of a single-row range scan.
    pub fn next_lexicographic(&self) -> Result<Vec<u8>> {
        let mut bytes = self.encode()?;
        for b in bytes.iter_mut().rev() {
            if *b == 0xFF {
                *b = 0;
            } else {
                *b += 1;
                return Ok(bytes);
            }
        }
        // All-0xFF key (practically unreachable): range has no finite exclusive end,
        // callers scanning this far should instead treat it as open-ended.
        bytes.push(0);
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_reference_row_key() {
        let key = RowKey::reference(42, SweepStrategy::Conservative, 7);
        let encoded = key.encode().unwrap();
        assert_eq!(encoded.len(), ROW_KEY_LEN);
        assert_eq!(RowKey::decode(&encoded).unwrap(), key);
    }

    #[test]
    fn round_trips_dedicated_row_key() {
        let key = RowKey::dedicated(1001, SweepStrategy::Thorough, 3, 2);
        let encoded = key.encode().unwrap();
        assert_eq!(RowKey::decode(&encoded).unwrap(), key);
    }

    #[test]
    fn dedicated_row_number_orders_chain_rows_ascending() {
        let a = RowKey::dedicated(1001, SweepStrategy::Conservative, 3, 0).encode().unwrap();
        let b = RowKey::dedicated(1001, SweepStrategy::Conservative, 3, 1).encode().unwrap();
        let c = RowKey::dedicated(1001, SweepStrategy::Conservative, 3, 2).encode().unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn next_lexicographic_is_strictly_greater_and_tight() {
        let key = RowKey::reference(42, SweepStrategy::Conservative, 7);
        let encoded = key.encode().unwrap();
        let next = key.next_lexicographic().unwrap();
        assert!(next.as_slice() > encoded.as_slice());

        let other = RowKey::reference(42, SweepStrategy::Conservative, 8).encode().unwrap();
        assert!(next.as_slice() <= other.as_slice());
    }

    #[test]
    fn rejects_oversized_shard() {
        let key = RowKey::reference(0, SweepStrategy::Conservative, MAX_SHARDS);
        assert!(key.encode().is_err());
    }
}
