//! The record store: the in-memory working set of survey responses, its
//! retention cap and its persistence port.

pub mod retention;
pub mod storage;
pub mod store;

pub use retention::{enforce_capacity, DEFAULT_CAPACITY};
pub use storage::{FileStorage, MemoryStorage, StoragePort};
pub use store::{DataChanged, RecordStore, FILTERS_KEY, RECORDS_KEY};
