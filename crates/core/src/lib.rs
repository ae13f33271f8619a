//! Core types, filtering and aggregation for the NPS dashboard.
//!
//! Everything here is synchronous and pure: functions take a record slice
//! and return derived values without touching their input.

pub mod alerts;
pub mod drivers;
pub mod error;
pub mod fields;
pub mod filter;
pub mod insights;
pub mod nps;
pub mod observer;
pub mod options;
pub mod parse;
pub mod ranking;
pub mod record;
pub mod summary;
pub mod trend;

pub use alerts::*;
pub use drivers::*;
pub use error::{Error, Result};
pub use fields::Field;
pub use filter::FilterCriteria;
pub use insights::*;
pub use nps::*;
pub use observer::{Observers, Subscription};
pub use options::*;
pub use ranking::*;
pub use record::*;
pub use summary::*;
pub use trend::*;
