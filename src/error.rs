/// Result alias used throughout the crate; call sites that need the concrete
/// kind can `downcast_ref::<SweepError>()` the returned `failure::Error`.
pub type Result<T> = std::result::Result<T, failure::Error>;

#[derive(Debug, failure::Fail)]
pub enum SweepError {
    /// Caller passed a `finePartition` inconsistent with its window
    #[fail(display = "invalid argument: {}", 0)]
    InvalidArgument(String),

    /// Row key or value bytes could not be decoded
    #[fail(display = "corrupt row at key {}: {}", key_hex, reason)]
    CorruptRow { key_hex: String, reason: String },

    /// A pointer entry in a reference row names a dedicated row that does not exist
    #[fail(display = "dangling pointer: anchor={} dedicated_row_number={}", anchor_ts, dedicated_row_number)]
    PointerDangling { anchor_ts: u64, dedicated_row_number: u32 },

    /// Compare-and-set lost a race and the persisted value did not move in our favor
    #[fail(display = "compare-and-set conflict: {}", 0)]
    CasConflict(String),

    /// Underlying collaborator (KVS, transaction table, shard count provider) failed
    #[fail(display = "{}", 0)]
    Other(String),
}

impl SweepError {
    pub fn invalid_argument<S: Into<String>>(msg: S) -> failure::Error {
        SweepError::InvalidArgument(msg.into()).into()
    }

    pub fn corrupt_row<S: Into<String>>(key: &[u8], reason: S) -> failure::Error {
        let key_hex = hex::encode(key);
        let reason = reason.into();
        log::error!(target: "sweep", "corrupt row at key {}: {}", key_hex, reason);
        SweepError::CorruptRow { key_hex, reason }.into()
    }

    pub fn pointer_dangling(anchor_ts: u64, dedicated_row_number: u32) -> failure::Error {
        log::error!(target: "sweep", "dangling pointer: anchor={} dedicated_row_number={}", anchor_ts, dedicated_row_number);
        SweepError::PointerDangling { anchor_ts, dedicated_row_number }.into()
    }

    pub fn cas_conflict<S: Into<String>>(msg: S) -> failure::Error {
        SweepError::CasConflict(msg.into()).into()
    }
}
