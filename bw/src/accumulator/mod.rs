//! Change accumulation
//!
//! The ChangeAccumulator turns raw change events into per-category batches,
//! skipping ignored paths and files whose content hash has not changed.

mod batch;
mod ignore;
mod record;

pub use batch::ChangeAccumulator;
pub use ignore::IgnoreSet;
pub use record::{FileRecord, hash_file};
