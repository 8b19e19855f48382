//! Cleanup path (spec §4.5): delete a fully-swept partition's reference row and every
//! dedicated chain row it points at.

use std::collections::HashMap;

use crate::cells::common::{decode_reference_row, fetch_row, ReferenceEntry};
use crate::cells::SweepableCells;
use crate::codec::RowKey;
use crate::db::traits::{RowRange, Table};
use crate::error::Result;
use crate::types::ShardAndStrategy;

impl SweepableCells {
    /// `deleteNonDedicatedRow` (spec §4.5 step 1).
    pub fn delete_non_dedicated_row(&self, shard_and_strategy: ShardAndStrategy, fine_partition: u64) -> Result<()> {
        let key = RowKey::reference(fine_partition, shard_and_strategy.strategy, shard_and_strategy.shard);
        let start = key.encode()?;
        let end = key.next_lexicographic()?;
        self.store.delete_range(Table::SweepQueue, &RowRange::new(start, end))?;
        log::debug!(
            target: "sweep",
            "deleted reference row for {:?}/{}",
            shard_and_strategy,
            fine_partition
        );
        Ok(())
    }

    /// `deleteDedicatedRows` (spec §4.5 step 2). The reference row must still be present —
    /// call this before [`Self::delete_non_dedicated_row`], not after.
    pub fn delete_dedicated_rows(&self, shard_and_strategy: ShardAndStrategy, fine_partition: u64) -> Result<()> {
        let shard = shard_and_strategy.shard;
        let strategy = shard_and_strategy.strategy;

        let reference_key = RowKey::reference(fine_partition, strategy, shard);
        let Some(row) = fetch_row(self.store.as_ref(), &reference_key)? else {
            return Ok(());
        };

        let mut anchors: HashMap<u64, u32> = HashMap::new();
        for entry in decode_reference_row(&row, fine_partition)? {
            if let ReferenceEntry::Pointer { start_ts, num_dedicated_rows, .. } = entry {
                anchors
                    .entry(start_ts)
                    .and_modify(|n| *n = (*n).max(num_dedicated_rows))
                    .or_insert(num_dedicated_rows);
            }
        }

        for (anchor_ts, num_dedicated_rows) in anchors {
            if num_dedicated_rows == 0 {
                continue;
            }
            let first_row = RowKey::dedicated(anchor_ts, strategy, shard, 0).encode()?;
            let last_row = RowKey::dedicated(anchor_ts, strategy, shard, num_dedicated_rows - 1);
            let end = last_row.next_lexicographic()?;
            self.store.delete_range(Table::SweepQueue, &RowRange::new(first_row, end))?;
            log::debug!(
                target: "sweep",
                "deleted {} dedicated rows for anchor {}",
                num_dedicated_rows,
                anchor_ts
            );
        }

        Ok(())
    }
}
