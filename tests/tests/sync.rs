//! Sync coordinator scenarios against the mock data source.

use integration_tests::{fixtures, mocks::MockDataSource};
use nps_core::FilterCriteria;
use parking_lot::Mutex;
use record_store::{MemoryStorage, RecordStore};
use refresh::{SyncCoordinator, SyncEvent, SyncOutcome, SyncStatus};
use std::sync::Arc;
use std::time::Duration;

fn setup(source: &MockDataSource) -> (Arc<RecordStore>, Arc<SyncCoordinator>) {
    let store = Arc::new(RecordStore::new(Arc::new(MemoryStorage::new())));
    let coordinator = Arc::new(SyncCoordinator::new(
        Arc::new(source.clone()),
        store.clone(),
    ));
    (store, coordinator)
}

fn record_events(coordinator: &SyncCoordinator) -> (Arc<Mutex<Vec<SyncEvent>>>, nps_core::Subscription) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let sub = coordinator.subscribe(move |e| sink.lock().push(e.clone()));
    (events, sub)
}

#[tokio::test]
async fn test_back_to_back_refresh_issues_one_fetch() {
    let source = MockDataSource::new(fixtures::sample_records());
    let (store, coordinator) = setup(&source);
    source.set_hold(true);

    let first = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.refresh_now().await })
    };
    source.wait_entered().await;
    assert!(coordinator.is_fetching());

    let second = coordinator.refresh_now().await;
    assert!(matches!(second, SyncOutcome::Skipped));

    source.release();
    let first = first.await.unwrap();
    assert!(matches!(first, SyncOutcome::Applied { record_count: 8 }));
    assert_eq!(source.fetch_count(), 1);
    assert_eq!(store.len(), 8);
}

#[tokio::test]
async fn test_failed_fetch_leaves_store_unchanged() {
    let source = MockDataSource::new(fixtures::sample_records());
    let (store, coordinator) = setup(&source);

    coordinator.refresh_now().await;
    let before = store.current();
    let (events, _sub) = record_events(&coordinator);

    source.set_should_fail(true);
    let outcome = coordinator.refresh_now().await;

    let err = outcome.error().expect("fetch should fail");
    assert!(err.is_transient());
    assert_eq!(coordinator.status(), SyncStatus::Failed);
    assert_eq!(store.len(), 8);
    assert_eq!(*store.current(), *before);
    assert!(matches!(events.lock().as_slice(), [SyncEvent::Failed { .. }]));

    source.set_should_fail(false);
    source.set_records(fixtures::sample_records()[..3].to_vec());
    assert!(coordinator.refresh_now().await.is_applied());
    assert_eq!(store.len(), 3);
}

#[tokio::test]
async fn test_no_data_is_distinct_from_failure() {
    let source = MockDataSource::new(fixtures::sample_records());
    let (store, coordinator) = setup(&source);
    coordinator.refresh_now().await;

    source.set_has_data(false);
    let outcome = coordinator.refresh_now().await;

    assert!(matches!(outcome, SyncOutcome::NoData));
    assert_eq!(coordinator.status(), SyncStatus::NoData);
    assert_eq!(store.len(), 8);
    assert_eq!(source.fetch_count(), 1);
}

#[tokio::test]
async fn test_store_notifies_record_count_once_per_sync() {
    let source = MockDataSource::new(fixtures::sample_records());
    let (store, coordinator) = setup(&source);

    let counts = Arc::new(Mutex::new(Vec::new()));
    let sink = counts.clone();
    let _sub = store.subscribe(move |e| sink.lock().push(e.record_count));

    coordinator.refresh_now().await;
    assert_eq!(*counts.lock(), vec![8]);
}

#[tokio::test(start_paused = true)]
async fn test_rapid_filter_changes_fetch_once_with_latest() {
    let source = MockDataSource::new(fixtures::sample_records());
    let (store, coordinator) = setup(&source);
    let (events, _sub) = record_events(&coordinator);

    for state in ["Delhi", "Karnataka", "Tamil Nadu"] {
        coordinator.on_filter_changed(FilterCriteria::all().with_state(state));
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(source.fetch_count(), 1);
    assert_eq!(
        source.requests()[0].state.as_deref(),
        Some("Tamil Nadu")
    );
    assert!(store.current().iter().all(|r| r.state == "Tamil Nadu"));
    assert_eq!(store.len(), 2);

    let requested = events
        .lock()
        .iter()
        .filter(|e| matches!(e, SyncEvent::FilterRequested(_)))
        .count();
    assert_eq!(requested, 3);
}

#[tokio::test(start_paused = true)]
async fn test_filter_during_fetch_runs_right_after_it() {
    let source = MockDataSource::new(fixtures::sample_records());
    let (store, coordinator) = setup(&source);
    source.set_hold(true);

    let first = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.refresh_now().await })
    };
    source.wait_entered().await;

    coordinator.on_filter_changed(FilterCriteria::all().with_state("Delhi"));
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(source.fetch_count(), 1);

    source.set_hold(false);
    source.release();
    assert!(first.await.unwrap().is_applied());

    assert_eq!(source.fetch_count(), 2);
    assert_eq!(source.requests()[0], FilterCriteria::all());
    assert_eq!(source.requests()[1].state.as_deref(), Some("Delhi"));
    assert_eq!(store.len(), 2);
    assert!(store.current().iter().all(|r| r.state == "Delhi"));
}

#[tokio::test(start_paused = true)]
async fn test_periodic_sync_survives_failures() {
    let source = MockDataSource::new(fixtures::sample_records());
    let (store, coordinator) = setup(&source);
    let (events, _sub) = record_events(&coordinator);

    source.set_should_fail(true);
    coordinator.start(Duration::from_secs(30));
    tokio::time::sleep(Duration::from_secs(65)).await;

    let failures = events
        .lock()
        .iter()
        .filter(|e| matches!(e, SyncEvent::Failed { .. }))
        .count();
    assert_eq!(failures, 3);
    assert!(store.is_empty());

    source.set_should_fail(false);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(store.len(), 8);
    assert_eq!(coordinator.status(), SyncStatus::Synced);

    coordinator.stop();
    let fetches = source.fetch_count();
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(source.fetch_count(), fetches);
}

#[tokio::test]
async fn test_stop_when_never_started() {
    let source = MockDataSource::new(vec![]);
    let (_, coordinator) = setup(&source);
    coordinator.stop();
    assert_eq!(coordinator.status(), SyncStatus::NeverSynced);
}
