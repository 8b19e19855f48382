mod cell;
mod shard_and_strategy;
mod sweep_batch;
mod table_ref;
mod write_info;

pub use cell::*;
pub use shard_and_strategy::*;
pub use sweep_batch::*;
pub use table_ref::*;
pub use write_info::*;
