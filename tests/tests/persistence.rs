//! Working-set persistence across restarts, on the file backend.

use integration_tests::{fixtures, mocks::MockDataSource};
use nps_core::FilterCriteria;
use record_store::{FileStorage, RecordStore, DEFAULT_CAPACITY, FILTERS_KEY, RECORDS_KEY};
use refresh::SyncCoordinator;
use std::sync::Arc;

fn open_store(dir: &std::path::Path) -> Arc<RecordStore> {
    let storage = FileStorage::open(dir).unwrap();
    Arc::new(RecordStore::new(Arc::new(storage)))
}

#[tokio::test]
async fn test_synced_records_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let source = MockDataSource::new(fixtures::sample_records());

    {
        let store = open_store(dir.path());
        let coordinator = SyncCoordinator::new(Arc::new(source.clone()), store.clone());
        assert!(coordinator.refresh_now().await.is_applied());
    }
    assert!(dir.path().join(format!("{RECORDS_KEY}.json")).exists());

    let restored = open_store(dir.path());
    assert_eq!(restored.restore(), 8);
    assert_eq!(*restored.current(), fixtures::sample_records());
}

#[test]
fn test_persisted_array_keeps_newest_in_date_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());

    let records = fixtures::daily_records("2024", fixtures::day(2023, 1, 1), 650, 9);
    assert_eq!(store.load(records), DEFAULT_CAPACITY);

    let restored = open_store(dir.path());
    assert_eq!(restored.restore(), DEFAULT_CAPACITY);
    let current = restored.current();
    assert_eq!(current[0].response_day(), Some(fixtures::day(2023, 5, 31)));
    assert_eq!(
        current[DEFAULT_CAPACITY - 1].response_day(),
        Some(fixtures::day(2024, 10, 11))
    );
}

#[tokio::test]
async fn test_filter_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let source = MockDataSource::new(fixtures::sample_records());
    let criteria = FilterCriteria::all()
        .with_region("South")
        .with_dates(Some(fixtures::day(2024, 1, 17)), None);

    {
        let store = open_store(dir.path());
        let coordinator = Arc::new(SyncCoordinator::new(Arc::new(source.clone()), store));
        coordinator.on_filter_changed(criteria.clone());
    }
    assert!(dir.path().join(format!("{FILTERS_KEY}.json")).exists());

    let store = open_store(dir.path());
    let coordinator = SyncCoordinator::new(Arc::new(source.clone()), store.clone());
    assert_eq!(coordinator.active_filter(), criteria);

    assert!(coordinator.refresh_now().await.is_applied());
    let ids: Vec<String> = store.current().iter().map(|r| r.store_id.clone()).collect();
    assert_eq!(ids, vec!["3018", "3019", "3033", "3039"]);
}

#[test]
fn test_clear_removes_everything() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());
    store.load(fixtures::sample_records());
    store.save_filters(&FilterCriteria::all().with_state("Delhi"));

    store.clear();

    assert!(store.is_empty());
    assert!(!dir.path().join(format!("{RECORDS_KEY}.json")).exists());
    assert!(!dir.path().join(format!("{FILTERS_KEY}.json")).exists());
    assert_eq!(open_store(dir.path()).restore(), 0);
}
