//! The transaction/commit-timestamp table (spec §6), consumed but not owned by this crate.
//! Grounded on the teacher's `db/traits/mod.rs` `KvcTransaction` commit/abort shape, adapted
//! from a batch-of-puts abstraction to the single-key-per-`startTs` CAS this subsystem needs.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::Result;

/// What the transaction table knows about one `startTs` (spec §4.4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitState {
    Committed(u64),
    Aborted,
}

pub trait TransactionTable: Send + Sync {
    /// `getCommitTs(startTs)`. `None` means `TS_UNKNOWN` — no entry, transaction uncommitted.
    fn get_commit_state(&self, start_ts: u64) -> Result<Option<CommitState>>;

    /// `tryAbort(startTs)` via conditional put: writes the aborted sentinel iff no entry
    /// exists yet. Returns the state now on record — `Aborted` if this call won the race,
    /// or whatever a concurrent committer wrote if it lost (spec §4.4.4, §9 "In-band abort
    /// race": the conditional put is the single serialization point, and losers observe the
    /// winner's outcome rather than retrying).
    fn try_abort(&self, start_ts: u64) -> Result<CommitState>;
}

/// In-memory test double, and a reasonable starting point for wiring a real backend that
/// fronts the commit-timestamp table with a CAS-capable KVS.
#[derive(Debug, Default)]
pub struct InMemoryTransactionTable {
    entries: RwLock<HashMap<u64, CommitState>>,
}

impl InMemoryTransactionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commit(&self, start_ts: u64, commit_ts: u64) {
        self.entries.write().unwrap().insert(start_ts, CommitState::Committed(commit_ts));
    }
}

impl TransactionTable for InMemoryTransactionTable {
    fn get_commit_state(&self, start_ts: u64) -> Result<Option<CommitState>> {
        Ok(self.entries.read().unwrap().get(&start_ts).copied())
    }

    fn try_abort(&self, start_ts: u64) -> Result<CommitState> {
        let mut entries = self.entries.write().unwrap();
        let state = *entries.entry(start_ts).or_insert(CommitState::Aborted);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_abort_wins_when_uncommitted() {
        let table = InMemoryTransactionTable::new();
        assert_eq!(table.try_abort(1000).unwrap(), CommitState::Aborted);
        assert_eq!(table.get_commit_state(1000).unwrap(), Some(CommitState::Aborted));
    }

    #[test]
    fn try_abort_loses_to_a_racing_commit() {
        let table = InMemoryTransactionTable::new();
        table.commit(1000, 1005);
        assert_eq!(table.try_abort(1000).unwrap(), CommitState::Committed(1005));
    }
}
