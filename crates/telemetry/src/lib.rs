//! Internal telemetry for the NPS dashboard.
//!
//! Structured logging setup plus in-process counters and component health
//! that the daemon reports through its own logs.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
