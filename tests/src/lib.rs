//! Shared helpers for the cross-crate scenario tests.

pub mod fixtures;
pub mod mocks;
