//! Mock implementations for testing.

use async_trait::async_trait;
use nps_core::{filter, Error, FilterCriteria, Result, SurveyRecord};
use parking_lot::Mutex;
use refresh::{Availability, DataSource};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Data source that serves an in-memory record set.
///
/// It implements the same `DataSource` trait as `HttpDataSource`, applying
/// the requested criteria with the filter engine the way the backend would.
/// A hold gate lets tests keep a fetch in flight until they release it.
#[derive(Clone)]
pub struct MockDataSource {
    records: Arc<Mutex<Vec<SurveyRecord>>>,
    has_data: Arc<AtomicBool>,
    should_fail: Arc<AtomicBool>,
    fetch_count: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<FilterCriteria>>>,
    hold: Arc<AtomicBool>,
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl MockDataSource {
    pub fn new(records: Vec<SurveyRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
            has_data: Arc::new(AtomicBool::new(true)),
            should_fail: Arc::new(AtomicBool::new(false)),
            fetch_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            hold: Arc::new(AtomicBool::new(false)),
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }

    /// Replace the served records.
    pub fn set_records(&self, records: Vec<SurveyRecord>) {
        *self.records.lock() = records;
    }

    /// Make the availability check report an empty backend.
    pub fn set_has_data(&self, has_data: bool) {
        self.has_data.store(has_data, Ordering::SeqCst);
    }

    /// Set failure mode for testing error handling.
    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    /// Keep subsequent fetches pending until [`MockDataSource::release`].
    pub fn set_hold(&self, hold: bool) {
        self.hold.store(hold, Ordering::SeqCst);
    }

    /// Wait until a held fetch has started.
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Let one held fetch complete.
    pub fn release(&self) {
        self.release.notify_one();
    }

    /// Number of fetches issued.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Criteria of every fetch, in order.
    pub fn requests(&self) -> Vec<FilterCriteria> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl DataSource for MockDataSource {
    async fn check_availability(&self) -> Result<Availability> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(Error::fetch(None, "Mock source unreachable"));
        }
        Ok(Availability {
            success: true,
            has_data: self.has_data.load(Ordering::SeqCst),
        })
    }

    async fn fetch(&self, criteria: &FilterCriteria) -> Result<Vec<SurveyRecord>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(criteria.clone());

        if self.hold.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }

        if self.should_fail.load(Ordering::SeqCst) {
            return Err(Error::fetch(Some(503), "Mock source failure"));
        }

        let records = self.records.lock().clone();
        Ok(filter::apply(&records, criteria))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[tokio::test]
    async fn test_mock_source_filters_and_counts() {
        let mock = MockDataSource::new(fixtures::sample_records());

        let all = mock.fetch(&FilterCriteria::all()).await.unwrap();
        assert_eq!(all.len(), 8);

        let karnataka = mock
            .fetch(&FilterCriteria::all().with_state("Karnataka"))
            .await
            .unwrap();
        assert_eq!(karnataka.len(), 2);
        assert!(karnataka.iter().all(|r| r.state == "Karnataka"));
        assert_eq!(mock.fetch_count(), 2);
        assert_eq!(mock.requests()[1].state.as_deref(), Some("Karnataka"));
    }

    #[tokio::test]
    async fn test_mock_source_failure_mode() {
        let mock = MockDataSource::new(vec![]);
        mock.set_should_fail(true);
        assert!(mock.check_availability().await.is_err());
        assert!(mock.fetch(&FilterCriteria::all()).await.is_err());
    }
}
