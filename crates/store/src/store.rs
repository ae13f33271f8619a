//! The record store: the capacity-capped working set of survey records.

use nps_core::{FilterCriteria, Observers, Subscription, SurveyRecord};
use parking_lot::RwLock;
use std::sync::Arc;
use telemetry::{health, metrics};
use tracing::{debug, info, warn};

use crate::retention::{enforce_capacity, DEFAULT_CAPACITY};
use crate::storage::StoragePort;

/// Storage key for the persisted working set (JSON array of records).
pub const RECORDS_KEY: &str = "nps-records";

/// Storage key for the last requested filter criteria.
pub const FILTERS_KEY: &str = "nps-filters";

/// Emitted once per mutation of the working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataChanged {
    pub record_count: usize,
}

#[derive(Default)]
struct StoreState {
    records: Arc<Vec<SurveyRecord>>,
    last_applied_seq: u64,
}

/// Holds the current working set and notifies subscribers when it changes.
///
/// Readers get cheap immutable snapshots from [`RecordStore::current`];
/// every mutation swaps in a new snapshot, persists it and then notifies.
pub struct RecordStore {
    storage: Arc<dyn StoragePort>,
    capacity: usize,
    state: RwLock<StoreState>,
    observers: Observers<DataChanged>,
}

impl RecordStore {
    /// Creates an empty store with the default retention cap.
    pub fn new(storage: Arc<dyn StoragePort>) -> Self {
        Self::with_capacity(storage, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(storage: Arc<dyn StoragePort>, capacity: usize) -> Self {
        Self {
            storage,
            capacity,
            state: RwLock::new(StoreState::default()),
            observers: Observers::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of the working set.
    pub fn current(&self) -> Arc<Vec<SurveyRecord>> {
        self.state.read().records.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registers a change listener.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&DataChanged) + Send + Sync + 'static,
    {
        self.observers.subscribe(callback)
    }

    /// Reloads the persisted working set. Unreadable data is logged and
    /// treated as empty. Returns the restored record count.
    pub fn restore(&self) -> usize {
        let records = match self.storage.read(RECORDS_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Vec<SurveyRecord>>(&json) {
                Ok(records) => records,
                Err(e) => {
                    warn!(error = %e, "Persisted records are unreadable, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read persisted records");
                health().storage.set_unhealthy(e.to_string());
                Vec::new()
            }
        };

        let count = self.commit(records, None, false).unwrap_or_default();
        info!(record_count = count, "Restored working set");
        count
    }

    /// Replaces the working set. Returns the resulting record count.
    pub fn load(&self, records: Vec<SurveyRecord>) -> usize {
        self.commit(records, None, true).unwrap_or_default()
    }

    /// Adds records after the existing ones, then applies the cap.
    ///
    /// The existing set is read and replaced under one write lock, so a
    /// concurrent `load` or `apply_fetch` is never overwritten.
    pub fn append(&self, records: Vec<SurveyRecord>) -> usize {
        self.commit_with(None, true, |existing| {
            let mut combined = Vec::with_capacity(existing.len() + records.len());
            combined.extend_from_slice(existing);
            combined.extend(records);
            combined
        })
        .unwrap_or_default()
    }

    /// Replaces the working set with the result of fetch `seq`, unless a
    /// fetch with the same or a later sequence number was already applied.
    ///
    /// Returns `None` when the result was stale and discarded.
    pub fn apply_fetch(&self, seq: u64, records: Vec<SurveyRecord>) -> Option<usize> {
        let last = self.state.read().last_applied_seq;
        if seq <= last {
            debug!(seq, last_applied = last, "Discarding stale fetch result");
            return None;
        }
        self.commit(records, Some(seq), true)
    }

    /// Empties the working set and removes everything persisted.
    pub fn clear(&self) {
        for key in [RECORDS_KEY, FILTERS_KEY] {
            if let Err(e) = self.storage.clear(key) {
                warn!(key, error = %e, "Failed to clear persisted key");
                metrics().persist_errors.inc();
            }
        }
        self.commit(Vec::new(), None, false);
    }

    /// Persists the filter criteria last requested by the user.
    pub fn save_filters(&self, criteria: &FilterCriteria) {
        let result = serde_json::to_string(criteria)
            .map_err(nps_core::Error::from)
            .and_then(|json| self.storage.write(FILTERS_KEY, &json));
        if let Err(e) = result {
            warn!(error = %e, "Failed to persist filters");
            metrics().persist_errors.inc();
        }
    }

    /// The persisted filter criteria, if any.
    pub fn saved_filters(&self) -> Option<FilterCriteria> {
        let json = self.storage.read(FILTERS_KEY).ok().flatten()?;
        match serde_json::from_str(&json) {
            Ok(criteria) => Some(criteria),
            Err(e) => {
                warn!(error = %e, "Persisted filters are unreadable");
                None
            }
        }
    }

    /// Caps, swaps in, persists and announces a new working set.
    ///
    /// Returns `None` only when `seq` lost a race with a newer fetch.
    fn commit(
        &self,
        records: Vec<SurveyRecord>,
        seq: Option<u64>,
        persist: bool,
    ) -> Option<usize> {
        self.commit_with(seq, persist, |_| records)
    }

    /// Like [`Self::commit`], building the new set from the current one
    /// while the write lock is held.
    fn commit_with<F>(&self, seq: Option<u64>, persist: bool, build: F) -> Option<usize>
    where
        F: FnOnce(&[SurveyRecord]) -> Vec<SurveyRecord>,
    {
        let (snapshot, evicted) = {
            let mut state = self.state.write();
            if let Some(seq) = seq {
                if seq <= state.last_applied_seq {
                    return None;
                }
                state.last_applied_seq = seq;
            }

            let mut records = build(&state.records);
            let evicted = enforce_capacity(&mut records, self.capacity);
            let snapshot = Arc::new(records);
            state.records = snapshot.clone();
            (snapshot, evicted)
        };

        if evicted > 0 {
            metrics().records_evicted.inc_by(evicted as u64);
            debug!(evicted, capacity = self.capacity, "Evicted oldest records");
        }

        let record_count = snapshot.len();
        metrics().records_loaded.set(record_count as u64);

        if persist {
            self.persist(&snapshot);
        }

        self.observers.notify(&DataChanged { record_count });
        Some(record_count)
    }

    fn persist(&self, records: &[SurveyRecord]) {
        let result = serde_json::to_string(records)
            .map_err(nps_core::Error::from)
            .and_then(|json| self.storage.write(RECORDS_KEY, &json));

        match result {
            Ok(()) => health().storage.set_healthy(),
            Err(e) => {
                warn!(error = %e, "Failed to persist working set");
                metrics().persist_errors.inc();
                health().storage.set_unhealthy(e.to_string());
            }
        }
    }
}
