use crate::types::WriteInfo;

/// Output of `getBatchForPartition` (spec §4.4.9).
#[derive(Debug, Clone)]
pub struct SweepBatch {
    pub writes: Vec<WriteInfo>,
    pub last_swept_timestamp: u64,
}

/// Accumulates writes and a progress watermark while a read is in flight, then freezes
/// into an immutable [`SweepBatch`] (spec §9 "Batch construction").
#[derive(Debug, Default)]
pub struct SweepBatchBuilder {
    writes: Vec<WriteInfo>,
    progress_ts: Option<u64>,
}

impl SweepBatchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, write: WriteInfo) {
        self.writes.push(write);
    }

    /// Records that `ts` has been fully processed; the watermark only ever moves forward.
    pub fn advance_progress(&mut self, ts: u64) {
        self.progress_ts = Some(match self.progress_ts {
            Some(current) => current.max(ts),
            None => ts,
        });
    }

    pub fn progress_ts(&self) -> Option<u64> {
        self.progress_ts
    }

    pub fn freeze(self, last_swept_timestamp: u64) -> SweepBatch {
        SweepBatch { writes: self.writes, last_swept_timestamp }
    }
}
