//! The sync coordinator.
//!
//! Keeps the record store current by fetching from a [`DataSource`] on a
//! fixed interval, on demand, and after (debounced) filter changes.
//!
//! Only one fetch is ever in flight. Timer ticks and manual refreshes that
//! arrive meanwhile are dropped; a filter request that arrives meanwhile is
//! remembered and runs once as soon as the current fetch finishes. Every
//! fetch carries a sequence number and the store refuses results older than
//! the last one applied.

use chrono::{DateTime, Utc};
use nps_core::{FilterCriteria, Observers, Result, Subscription, SurveyRecord};
use parking_lot::{Mutex, RwLock};
use record_store::RecordStore;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use telemetry::{health, metrics};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::debounce::Debouncer;
use crate::source::DataSource;
use crate::status::{SyncEvent, SyncOutcome, SyncStatus};

/// Quiet period applied to filter changes unless configured otherwise.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Tick,
    Manual,
    Filter,
}

impl Trigger {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Tick => "tick",
            Self::Manual => "manual",
            Self::Filter => "filter",
        }
    }
}

/// Holds the single-flight flag for as long as it lives.
struct FlightGuard<'a>(&'a AtomicBool);

impl<'a> FlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives fetches into a [`RecordStore`].
pub struct SyncCoordinator {
    source: Arc<dyn DataSource>,
    store: Arc<RecordStore>,
    in_flight: AtomicBool,
    filter_pending: AtomicBool,
    next_seq: AtomicU64,
    active_filter: Mutex<FilterCriteria>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    debouncer: Debouncer,
    status: RwLock<SyncStatus>,
    last_synced_at: RwLock<Option<DateTime<Utc>>>,
    observers: Observers<SyncEvent>,
}

impl SyncCoordinator {
    pub fn new(source: Arc<dyn DataSource>, store: Arc<RecordStore>) -> Self {
        Self::with_debounce(source, store, DEFAULT_DEBOUNCE)
    }

    /// Creates a coordinator whose active filter is the one last persisted
    /// by the store.
    pub fn with_debounce(
        source: Arc<dyn DataSource>,
        store: Arc<RecordStore>,
        debounce: Duration,
    ) -> Self {
        let active_filter = store.saved_filters().unwrap_or_default();
        Self {
            source,
            store,
            in_flight: AtomicBool::new(false),
            filter_pending: AtomicBool::new(false),
            next_seq: AtomicU64::new(0),
            active_filter: Mutex::new(active_filter),
            ticker: Mutex::new(None),
            debouncer: Debouncer::new(debounce),
            status: RwLock::new(SyncStatus::NeverSynced),
            last_synced_at: RwLock::new(None),
            observers: Observers::new(),
        }
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    pub fn status(&self) -> SyncStatus {
        *self.status.read()
    }

    /// Time of the last fetch that reached the backend successfully.
    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        *self.last_synced_at.read()
    }

    pub fn active_filter(&self) -> FilterCriteria {
        self.active_filter.lock().clone()
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.ticker
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&SyncEvent) + Send + Sync + 'static,
    {
        self.observers.subscribe(callback)
    }

    /// Starts the periodic cycle. The first fetch happens immediately.
    ///
    /// Calling `start` again restarts the cycle with the new period.
    pub fn start(self: &Arc<Self>, period: Duration) {
        let period = period.max(Duration::from_millis(1));
        let weak = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let Some(this) = weak.upgrade() else {
                    break;
                };
                // Each cycle gets its own task so stopping the ticker never
                // cancels a fetch that is already under way.
                tokio::spawn(async move {
                    this.run(Trigger::Tick).await;
                });
            }
        });

        if let Some(previous) = self.ticker.lock().replace(handle) {
            previous.abort();
        }
        info!(interval_ms = period.as_millis() as u64, "Sync cycle started");
    }

    /// Stops scheduling further ticks. In-flight fetches complete normally.
    pub fn stop(&self) {
        if let Some(handle) = self.ticker.lock().take() {
            handle.abort();
            info!("Sync cycle stopped");
        }
    }

    /// Runs one cycle right away, unless a fetch is already in flight.
    pub async fn refresh_now(&self) -> SyncOutcome {
        self.run(Trigger::Manual).await
    }

    /// Makes `criteria` the active filter and schedules a debounced fetch.
    pub fn on_filter_changed(self: &Arc<Self>, criteria: FilterCriteria) {
        debug!(?criteria, "Filter change requested");
        self.observers
            .notify(&SyncEvent::FilterRequested(criteria.clone()));
        self.store.save_filters(&criteria);
        *self.active_filter.lock() = criteria;

        let weak = Arc::downgrade(self);
        self.debouncer.schedule(move || async move {
            if let Some(this) = weak.upgrade() {
                this.run(Trigger::Filter).await;
            }
        });
    }

    async fn run(&self, trigger: Trigger) -> SyncOutcome {
        loop {
            if let Some(guard) = FlightGuard::acquire(&self.in_flight) {
                let outcome = self.fetch_and_apply(trigger).await;
                drop(guard);
                self.drain_pending_filter().await;
                return outcome;
            }

            if trigger != Trigger::Filter {
                metrics().syncs_skipped.inc();
                debug!(trigger = trigger.as_str(), "Fetch in flight, skipping");
                return SyncOutcome::Skipped;
            }

            self.filter_pending.store(true, Ordering::SeqCst);
            if self.in_flight.load(Ordering::SeqCst) {
                metrics().syncs_deferred.inc();
                debug!("Fetch in flight, deferring filter request");
                return SyncOutcome::Deferred;
            }
            // The holder finished before it could see the flag; take the
            // request back and retry, unless someone else already did.
            if !self.filter_pending.swap(false, Ordering::SeqCst) {
                metrics().syncs_deferred.inc();
                return SyncOutcome::Deferred;
            }
        }
    }

    async fn drain_pending_filter(&self) {
        while self.filter_pending.load(Ordering::SeqCst) {
            let Some(guard) = FlightGuard::acquire(&self.in_flight) else {
                // The current holder drains it.
                return;
            };
            if self.filter_pending.swap(false, Ordering::SeqCst) {
                self.fetch_and_apply(Trigger::Filter).await;
            }
            drop(guard);
        }
    }

    /// Availability check plus fetch. `Ok(None)` means the backend has no data.
    async fn fetch_records(&self, criteria: &FilterCriteria) -> Result<Option<Vec<SurveyRecord>>> {
        let availability = self.source.check_availability().await?;
        if !availability.success || !availability.has_data {
            return Ok(None);
        }
        self.source.fetch(criteria).await.map(Some)
    }

    async fn fetch_and_apply(&self, trigger: Trigger) -> SyncOutcome {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let criteria = self.active_filter();

        metrics().syncs_started.inc();
        self.set_status(SyncStatus::Syncing);
        debug!(seq, trigger = trigger.as_str(), "Fetch started");

        let started = Instant::now();
        let result = self.fetch_records(&criteria).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        metrics().fetch_latency_ms.observe(elapsed_ms);

        match result {
            Ok(Some(records)) => {
                self.mark_reached_backend();
                let fetched = records.len();
                match self.store.apply_fetch(seq, records) {
                    Some(record_count) => {
                        metrics().syncs_completed.inc();
                        self.set_status(SyncStatus::Synced);
                        info!(
                            seq,
                            trigger = trigger.as_str(),
                            fetched,
                            record_count,
                            elapsed_ms,
                            "Sync applied"
                        );
                        self.observers.notify(&SyncEvent::Completed {
                            seq,
                            record_count,
                            has_data: true,
                        });
                        SyncOutcome::Applied { record_count }
                    }
                    None => {
                        metrics().stale_results_discarded.inc();
                        self.set_status(SyncStatus::Synced);
                        warn!(seq, "Discarded stale fetch result");
                        SyncOutcome::Stale
                    }
                }
            }
            Ok(None) => {
                self.mark_reached_backend();
                metrics().syncs_completed.inc();
                self.set_status(SyncStatus::NoData);
                info!(seq, trigger = trigger.as_str(), "Backend has no data");
                self.observers.notify(&SyncEvent::Completed {
                    seq,
                    record_count: self.store.len(),
                    has_data: false,
                });
                SyncOutcome::NoData
            }
            Err(e) => {
                metrics().syncs_failed.inc();
                health().data_source.set_unhealthy(e.to_string());
                self.set_status(SyncStatus::Failed);
                warn!(
                    seq,
                    trigger = trigger.as_str(),
                    code = e.code(),
                    transient = e.is_transient(),
                    error = %e,
                    "Sync failed, keeping current records"
                );
                self.observers.notify(&SyncEvent::Failed {
                    seq,
                    code: e.code(),
                    message: e.to_string(),
                    transient: e.is_transient(),
                });
                SyncOutcome::Failed(e)
            }
        }
    }

    fn mark_reached_backend(&self) {
        health().data_source.set_healthy();
        *self.last_synced_at.write() = Some(Utc::now());
    }

    fn set_status(&self, status: SyncStatus) {
        *self.status.write() = status;
    }
}

impl Drop for SyncCoordinator {
    fn drop(&mut self) {
        if let Some(handle) = self.ticker.get_mut().take() {
            handle.abort();
        }
    }
}
