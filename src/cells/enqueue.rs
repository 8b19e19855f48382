//! Enqueue path (spec §4.3).

use std::collections::{HashMap, HashSet};

use crate::cells::SweepableCells;
use crate::codec::{ColumnKey, QueueValue, RowKey};
use crate::config::{fine_partition_start, ts_partition_fine, SweepStrategy, MAX_CELLS_DEDICATED, MAX_CELLS_GENERIC};
use crate::db::traits::{QueueCell, Table};
use crate::error::Result;
use crate::types::{ShardAndStrategy, WriteInfo};

impl SweepableCells {
    /// `enqueue(writes) -> Set<ShardAndStrategy>` (spec §6). All of `writes` are enqueued
    /// under the single `strategy` the caller supplies — a sweeper routes a commit's writes
    /// to conservative and/or thorough queues itself, calling this once per strategy it
    /// needs (DESIGN.md: resolved ambiguity, since the spec's `WriteInfo` carries no
    /// strategy of its own).
    pub fn enqueue(&self, writes: &[WriteInfo], strategy: SweepStrategy) -> Result<HashSet<ShardAndStrategy>> {
        let num_shards = self.shard_count.current_num_shards()?;

        // Group by (shard, finePartition, startTs) per spec §4.3 step 1.
        let mut groups: HashMap<(u32, u64, u64), Vec<&WriteInfo>> = HashMap::new();
        for write in writes {
            let shard = crate::partition::shard_for(&write.table_ref, &write.cell, num_shards);
            let fine_partition = ts_partition_fine(write.start_ts);
            groups.entry((shard, fine_partition, write.start_ts)).or_default().push(write);
        }

        let mut touched = HashSet::new();
        let mut cells = Vec::new();

        for ((shard, fine_partition, start_ts), group_writes) in &groups {
            let shard = *shard;
            let fine_partition = *fine_partition;
            let start_ts = *start_ts;
            let n = group_writes.len() as u32;
            let offset = start_ts - fine_partition_start(fine_partition);
            let reference_row = RowKey::reference(fine_partition, strategy, shard).encode()?;

            if n <= MAX_CELLS_GENERIC {
                for (write_index, write) in group_writes.iter().enumerate() {
                    let column_key = ColumnKey::cell(offset, write_index as u32).encode()?;
                    let value = QueueValue::Write {
                        table_ref: write.table_ref.clone(),
                        cell: write.cell.clone(),
                        is_tombstone: write.is_tombstone,
                    }
                    .encode()?;
                    cells.push(QueueCell { row_key: reference_row.clone(), column_key: column_key.to_vec(), value });
                }
            } else {
                let num_dedicated_rows = ((n as u64 + MAX_CELLS_DEDICATED as u64 - 1) / MAX_CELLS_DEDICATED as u64) as u32;
                for (k, chunk) in group_writes.chunks(MAX_CELLS_DEDICATED as usize).enumerate() {
                    let k = k as u32;
                    let dedicated_row = RowKey::dedicated(start_ts, strategy, shard, k).encode()?;
                    for (write_index, write) in chunk.iter().enumerate() {
                        let column_key = ColumnKey::cell(0, write_index as u32).encode()?;
                        let value = QueueValue::Write {
                            table_ref: write.table_ref.clone(),
                            cell: write.cell.clone(),
                            is_tombstone: write.is_tombstone,
                        }
                        .encode()?;
                        cells.push(QueueCell {
                            row_key: dedicated_row.clone(),
                            column_key: column_key.to_vec(),
                            value,
                        });
                    }

                    let pointer_column = ColumnKey::pointer(offset, k).encode()?;
                    let pointer_value =
                        QueueValue::Pointer { dedicated_row_number: k, num_dedicated_rows }.encode()?;
                    cells.push(QueueCell {
                        row_key: reference_row.clone(),
                        column_key: pointer_column.to_vec(),
                        value: pointer_value,
                    });
                }
            }

            self.metrics.inc_enqueued_writes(strategy, n as u64);
            log::debug!(
                target: "sweep",
                "enqueued {} cells for shard={} strategy={:?} fine_partition={}",
                n,
                shard,
                strategy,
                fine_partition
            );
            touched.insert(ShardAndStrategy::new(shard, strategy));
        }

        if !cells.is_empty() {
            self.store.put_many(Table::SweepQueue, &cells)?;
        }

        Ok(touched)
    }
}
