//! Keeps the record store in step with the survey backend.
//!
//! - [`DataSource`]: where records come from ([`HttpDataSource`] in production)
//! - [`SyncCoordinator`]: periodic, manual and filter-driven fetches with a
//!   single fetch in flight at a time
//! - [`Debouncer`]: cancellable delayed execution for filter changes

pub mod config;
pub mod coordinator;
pub mod debounce;
pub mod source;
pub mod status;

pub use config::{validate_config, SourceConfig, SyncConfig};
pub use coordinator::{SyncCoordinator, DEFAULT_DEBOUNCE};
pub use debounce::Debouncer;
pub use source::{Availability, DataSource, HttpDataSource};
pub use status::{SyncEvent, SyncOutcome, SyncStatus};
