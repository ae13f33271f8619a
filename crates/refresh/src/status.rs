//! Sync status, events and per-cycle outcomes.

use nps_core::{Error, FilterCriteria};
use serde::Serialize;

/// Coarse state of the coordinator, for the presentation layer.
///
/// `NoData` and `Failed` are deliberately separate: the first means "show an
/// empty state", the second "offer a retry".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    NeverSynced,
    Syncing,
    Synced,
    NoData,
    Failed,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NeverSynced => "never_synced",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::NoData => "no_data",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notifications published by the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A caller asked for a new filtered view.
    FilterRequested(FilterCriteria),
    /// A fetch finished. `has_data` is false when the backend holds nothing
    /// and the store was left as it was.
    Completed {
        seq: u64,
        record_count: usize,
        has_data: bool,
    },
    /// A fetch failed; the store was left as it was.
    Failed {
        seq: u64,
        code: &'static str,
        message: String,
        transient: bool,
    },
}

/// Result of one attempted cycle.
#[derive(Debug)]
pub enum SyncOutcome {
    /// The fetched records replaced the working set.
    Applied { record_count: usize },
    /// The backend reported no data.
    NoData,
    /// Another fetch was in flight; this trigger was dropped.
    Skipped,
    /// A filter request arrived during a fetch and will run right after it.
    Deferred,
    /// The result lost to a newer fetch and was discarded.
    Stale,
    Failed(Error),
}

impl SyncOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}
