//! Read path (spec §4.4) — the hard algorithm.

use std::collections::{BTreeMap, HashMap};

use crate::cells::common::{decode_dedicated_row, decode_reference_row, fetch_row, ReferenceEntry};
use crate::cells::SweepableCells;
use crate::codec::RowKey;
use crate::config::{fine_partition_end, ts_partition_fine, SWEEP_BATCH_SIZE};
use crate::db::traits::Table;
use crate::error::{Result, SweepError};
use crate::txn_table::CommitState;
use crate::types::{Cell, ShardAndStrategy, SweepBatch, TableRef, WriteInfo};

/// What a reference-row group resolves to before its KVS-fetch has happened: either the
/// cells already in hand from the reference row, or a dedicated chain still to be read.
enum GroupSource {
    Direct(Vec<WriteInfo>),
    Dedicated { num_dedicated_rows: u32 },
}

impl SweepableCells {
    /// `getBatchForPartition(shardAndStrategy, finePartition, minExclusive, maxExclusive)`
    /// (spec §4.4). `sweep_ts` is the caller's current sweep horizon, checked against
    /// `maxExclusive` per the §4.4.1 input constraints.
    pub fn get_batch_for_partition(
        &self,
        shard_and_strategy: ShardAndStrategy,
        fine_partition: u64,
        min_exclusive: u64,
        max_exclusive: u64,
        sweep_ts: u64,
    ) -> Result<SweepBatch> {
        self.validate_window(fine_partition, min_exclusive, max_exclusive, sweep_ts)?;

        let shard = shard_and_strategy.shard;
        let strategy = shard_and_strategy.strategy;

        let reference_key = RowKey::reference(fine_partition, strategy, shard);
        let reference_row = fetch_row(self.store.as_ref(), &reference_key)?;

        // BTreeMap so iteration is ascending by startTs, exactly the order the cutoff
        // (spec §4.4.5) must process transactions in. Dedicated chains are NOT fetched
        // here — only the reference row's pointer entries are recorded, so a transaction
        // past the cutoff never costs a KVS read (spec §5: memory/IO is bounded by
        // SWEEP_BATCH_SIZE plus at most one dedicated chain in flight at a time).
        let mut grouped: BTreeMap<u64, GroupSource> = BTreeMap::new();

        if let Some(row) = reference_row {
            for entry in decode_reference_row(&row, fine_partition)? {
                match entry {
                    ReferenceEntry::Cell { start_ts, write } => {
                        if min_exclusive < start_ts && start_ts < max_exclusive {
                            match grouped.entry(start_ts).or_insert_with(|| GroupSource::Direct(Vec::new())) {
                                GroupSource::Direct(writes) => writes.push(write),
                                GroupSource::Dedicated { .. } => unreachable!(
                                    "spec §3 invariant: a startTs is never split across the reference row and a dedicated chain"
                                ),
                            }
                        }
                    }
                    ReferenceEntry::Pointer { start_ts, num_dedicated_rows, .. } => {
                        if min_exclusive < start_ts && start_ts < max_exclusive {
                            grouped.entry(start_ts).or_insert(GroupSource::Dedicated { num_dedicated_rows });
                        }
                    }
                }
            }
        }

        let mut latest: HashMap<(TableRef, Cell), WriteInfo> = HashMap::new();
        let mut deletions: HashMap<TableRef, Vec<(Cell, u64)>> = HashMap::new();
        let mut cumulative: u64 = 0;
        let mut cutoff_triggered = false;
        let mut progress_ts: Option<u64> = None;

        for (start_ts, source) in &grouped {
            let start_ts = *start_ts;

            // Only fetched now, one chain at a time, and only for a transaction the cutoff
            // has actually reached.
            let entries: Vec<WriteInfo> = match source {
                GroupSource::Direct(writes) => writes.clone(),
                GroupSource::Dedicated { num_dedicated_rows } => {
                    let mut cells = Vec::new();
                    for k in 0..*num_dedicated_rows {
                        let dedicated_key = RowKey::dedicated(start_ts, strategy, shard, k);
                        let dedicated_row = fetch_row(self.store.as_ref(), &dedicated_key)?
                            .ok_or_else(|| SweepError::pointer_dangling(start_ts, k))?;
                        cells.extend(decode_dedicated_row(&dedicated_row, start_ts)?);
                    }
                    cells
                }
            };

            let committed_ts = self.resolve_commit_state(start_ts)?;

            for write in &entries {
                cumulative += 1;
                match committed_ts {
                    Some(commit_ts) if commit_ts < max_exclusive => {
                        latest.insert((write.table_ref.clone(), write.cell.clone()), write.clone());
                    }
                    Some(_) => {
                        // committed at or after the sweep horizon: not yet visible, untouched.
                    }
                    None => {
                        deletions
                            .entry(write.table_ref.clone())
                            .or_default()
                            .push((write.cell.clone(), write.start_ts));
                    }
                }
            }

            progress_ts = Some(start_ts);
            if cumulative > SWEEP_BATCH_SIZE as u64 {
                cutoff_triggered = true;
                log::debug!(
                    target: "sweep",
                    "cutoff at startTs={} for shard={} strategy={:?} fine_partition={}",
                    start_ts,
                    shard,
                    strategy,
                    fine_partition
                );
                break;
            }
        }

        let aborted_count: u64 = deletions.values().map(|v| v.len() as u64).sum();
        for (table_ref, versions) in &deletions {
            self.store.delete_versions(Table::User(table_ref), versions)?;
        }

        self.metrics.inc_entries_read(strategy, cumulative);
        self.metrics.inc_aborted_writes_deleted(strategy, aborted_count);

        let partition_end = fine_partition_end(fine_partition);
        let last_swept_timestamp = if cutoff_triggered {
            progress_ts.expect("cutoff only triggers after at least one group is processed")
        } else {
            std::cmp::min(max_exclusive - 1, partition_end)
        };

        Ok(SweepBatch { writes: latest.into_values().collect(), last_swept_timestamp })
    }

    /// `TS_UNKNOWN` resolution with in-band abort (spec §4.4.4). Returns `Some(commitTs)` if
    /// committed, `None` if aborted (whether originally or newly, via the in-band abort).
    fn resolve_commit_state(&self, start_ts: u64) -> Result<Option<u64>> {
        match self.txn_table.get_commit_state(start_ts)? {
            Some(CommitState::Committed(commit_ts)) => Ok(Some(commit_ts)),
            Some(CommitState::Aborted) => Ok(None),
            None => {
                log::debug!(target: "sweep", "in-band abort of startTs={}", start_ts);
                match self.txn_table.try_abort(start_ts)? {
                    CommitState::Aborted => Ok(None),
                    CommitState::Committed(commit_ts) => Ok(Some(commit_ts)),
                }
            }
        }
    }

    fn validate_window(&self, fine_partition: u64, min_exclusive: u64, max_exclusive: u64, sweep_ts: u64) -> Result<()> {
        if min_exclusive >= max_exclusive {
            return Err(SweepError::invalid_argument(format!(
                "minExclusive {} must be < maxExclusive {}",
                min_exclusive, max_exclusive
            )));
        }
        if max_exclusive > sweep_ts {
            return Err(SweepError::invalid_argument(format!(
                "maxExclusive {} must be <= sweepTs {}",
                max_exclusive, sweep_ts
            )));
        }
        let lower_bound = ts_partition_fine(min_exclusive + 1);
        let upper_bound = ts_partition_fine(max_exclusive - 1);
        if !(lower_bound <= fine_partition && fine_partition <= upper_bound) {
            return Err(SweepError::invalid_argument(format!(
                "finePartition {} outside [{}, {}] implied by window ({}, {}]",
                fine_partition, lower_bound, upper_bound, min_exclusive, max_exclusive
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SweepStrategy;
    use crate::db::memory::MemoryKeyValueStore;
    use crate::shard_count::FixedShardCount;
    use crate::txn_table::InMemoryTransactionTable;
    use crate::types::TableRef;
    use std::sync::Arc;

    fn write(table: &str, row: &str, start_ts: u64) -> WriteInfo {
        WriteInfo::new(TableRef::new(table), Cell::new(row.as_bytes().to_vec(), b"col".to_vec()), start_ts, false)
    }

    struct Fixture {
        cells: SweepableCells,
        txn_table: Arc<InMemoryTransactionTable>,
    }

    fn fixture(num_shards: u32) -> Fixture {
        let txn_table = Arc::new(InMemoryTransactionTable::new());
        let cells = SweepableCells::new(
            Arc::new(MemoryKeyValueStore::new()),
            txn_table.clone(),
            Arc::new(FixedShardCount::new(num_shards)),
        );
        Fixture { cells, txn_table }
    }

    #[test]
    fn s1_single_entry_is_read_back() {
        let f = fixture(16);
        let w = write("tblC", "cellA", 1000);
        f.txn_table.commit(1000, 1000);
        let touched = f.cells.enqueue(&[w.clone()], SweepStrategy::Conservative).unwrap();
        let sas = *touched.iter().next().unwrap();

        let batch = f.cells.get_batch_for_partition(sas, 0, 999, 1200, 1200).unwrap();
        assert_eq!(batch.writes.len(), 1);
        assert_eq!(batch.writes[0].identity(), w.identity());
        assert_eq!(batch.last_swept_timestamp, 1199);
    }

    #[test]
    fn s2_wrong_shard_returns_empty() {
        let f = fixture(16);
        let w = write("tblC", "cellA", 1000);
        f.txn_table.commit(1000, 1000);
        let touched = f.cells.enqueue(&[w], SweepStrategy::Conservative).unwrap();
        let sas = *touched.iter().next().unwrap();
        let other = ShardAndStrategy::new((sas.shard + 1) % 16, sas.strategy);

        let batch = f.cells.get_batch_for_partition(other, 0, 999, 1200, 1200).unwrap();
        assert!(batch.writes.is_empty());
        assert_eq!(batch.last_swept_timestamp, 1199);
    }

    #[test]
    fn s3_aborted_write_is_dropped_and_deleted() {
        let f = fixture(16);
        let committed = write("tblC", "cellA", 1000);
        let aborted = write("tblC", "cellA", 1001);
        f.txn_table.commit(1000, 1000);
        // Pre-mark 1001 aborted: try_abort on an absent entry always wins.
        f.txn_table.try_abort(1001).unwrap();

        let touched = f
            .cells
            .enqueue(&[committed, aborted.clone()], SweepStrategy::Conservative)
            .unwrap();
        let sas = *touched.iter().next().unwrap();

        let batch = f.cells.get_batch_for_partition(sas, 0, 999, 1200, 1200).unwrap();
        assert_eq!(batch.writes.len(), 1);
        assert_eq!(batch.writes[0].start_ts, 1000);
    }

    #[test]
    fn s4_uncommitted_is_aborted_in_band() {
        let f = fixture(16);
        let committed = write("tblC", "cellA", 1000);
        let uncommitted = write("tblC", "cellA", 1001);
        f.txn_table.commit(1000, 1000);

        let touched = f
            .cells
            .enqueue(&[committed, uncommitted], SweepStrategy::Conservative)
            .unwrap();
        let sas = *touched.iter().next().unwrap();

        let batch = f.cells.get_batch_for_partition(sas, 0, 999, 1200, 1200).unwrap();
        assert_eq!(batch.writes.len(), 1);
        assert_eq!(batch.writes[0].start_ts, 1000);
        assert_eq!(
            f.txn_table.get_commit_state(1001).unwrap(),
            Some(crate::txn_table::CommitState::Aborted)
        );
    }

    #[test]
    fn s5_cutoff_stops_mid_scan_and_reports_progress() {
        // Spec §8 S5 uses startTs 0..9 with a minExclusive of -1; u64 has no negative, so
        // this shifts every startTs up by one (1..=10) and uses minExclusive=0 instead —
        // same shape, same arithmetic, no sentinel collision with a real startTs of 0.
        let f = fixture(1);
        let per_txn = 1 + crate::config::SWEEP_BATCH_SIZE / 5;
        let mut writes = Vec::new();
        for txn in 1..=10u64 {
            f.txn_table.commit(txn, txn);
            for i in 0..per_txn {
                writes.push(write("tblC", &format!("row{}_{}", txn, i), txn));
            }
        }
        let touched = f.cells.enqueue(&writes, SweepStrategy::Conservative).unwrap();
        let sas = *touched.iter().next().unwrap();

        let batch = f.cells.get_batch_for_partition(sas, 0, 0, 1200, 1200).unwrap();
        assert_eq!(batch.writes.len() as u64, crate::config::SWEEP_BATCH_SIZE as u64 + 5);
        assert_eq!(batch.last_swept_timestamp, 5);
    }

    #[test]
    fn rejects_min_exclusive_not_below_max_exclusive() {
        let f = fixture(16);
        let sas = ShardAndStrategy::new(0, SweepStrategy::Conservative);
        let err = f.cells.get_batch_for_partition(sas, 0, 1000, 1000, 2000).unwrap_err();
        assert!(matches!(
            err.downcast::<SweepError>().unwrap(),
            SweepError::InvalidArgument(_)
        ));
    }

    #[test]
    fn rejects_max_exclusive_above_sweep_ts() {
        let f = fixture(16);
        let sas = ShardAndStrategy::new(0, SweepStrategy::Conservative);
        let err = f.cells.get_batch_for_partition(sas, 0, 0, 2000, 1000).unwrap_err();
        assert!(matches!(
            err.downcast::<SweepError>().unwrap(),
            SweepError::InvalidArgument(_)
        ));
    }

    #[test]
    fn rejects_fine_partition_outside_window() {
        let f = fixture(16);
        let sas = ShardAndStrategy::new(0, SweepStrategy::Conservative);
        // window (0, 20001] spans fine partitions 0..=2; 5 is outside that range.
        let err = f.cells.get_batch_for_partition(sas, 5, 0, 20001, 20001).unwrap_err();
        assert!(matches!(
            err.downcast::<SweepError>().unwrap(),
            SweepError::InvalidArgument(_)
        ));
    }

    #[test]
    fn dangling_pointer_is_reported_not_silently_dropped() {
        let f = fixture(1);
        let mut writes = Vec::new();
        for i in 0..(crate::config::MAX_CELLS_GENERIC + 10) {
            writes.push(write("tblC", &format!("row{}", i), 1000));
        }
        f.txn_table.commit(1000, 1000);
        let touched = f.cells.enqueue(&writes, SweepStrategy::Conservative).unwrap();
        let sas = *touched.iter().next().unwrap();

        // Remove the dedicated chain row the reference row's pointer entry names, so the
        // read path's fetch of it comes back empty.
        let dedicated_key = RowKey::dedicated(1000, sas.strategy, sas.shard, 0);
        let encoded = dedicated_key.encode().unwrap();
        let end = dedicated_key.next_lexicographic().unwrap();
        f.cells
            .store
            .delete_range(crate::db::traits::Table::SweepQueue, &crate::db::traits::RowRange::new(encoded, end))
            .unwrap();

        let err = f.cells.get_batch_for_partition(sas, 0, 999, 1200, 1200).unwrap_err();
        assert!(matches!(
            err.downcast::<SweepError>().unwrap(),
            SweepError::PointerDangling { .. }
        ));
    }

    #[test]
    fn s7_latest_per_cell_reduction() {
        let f = fixture(16);
        for ts in [998u64, 1002, 997, 1001] {
            f.txn_table.commit(ts, ts);
        }
        let touched = f
            .cells
            .enqueue(
                &[
                    write("tblC", "cellA", 998),
                    write("tblC", "cellA", 1002),
                    write("tblC", "cellA", 997),
                    write("tblC", "cellA", 1001),
                ],
                SweepStrategy::Conservative,
            )
            .unwrap();
        let sas = *touched.iter().next().unwrap();

        let narrow = f.cells.get_batch_for_partition(sas, 0, 997, 1000, 1200).unwrap();
        assert_eq!(narrow.writes.len(), 1);
        assert_eq!(narrow.writes[0].start_ts, 998);

        let wide = f.cells.get_batch_for_partition(sas, 0, 997, 1200, 1200).unwrap();
        assert_eq!(wide.writes.len(), 1);
        assert_eq!(wide.writes[0].start_ts, 1002);
    }
}
