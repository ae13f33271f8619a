//! Filter and aggregation over the canonical sample export.

use integration_tests::fixtures::{self, day};
use nps_core::{
    compute_breakdown, compute_driver_averages, compute_nps, compute_store_ranking,
    compute_trend, default_drivers, evaluate_alerts, filter, filter_options, top_keywords,
    AggregateMetrics, AggregationConfig, AlertKind, AlertThresholds, Field, FilterCriteria,
    NpsCategory, SurveyRecord,
};

#[test]
fn test_sample_nps() {
    let records = fixtures::sample_records();
    let nps = compute_nps(&records);

    assert_eq!(nps.promoters, 3);
    assert_eq!(nps.passives, 3);
    assert_eq!(nps.detractors, 2);
    assert_eq!(nps.total, 8);
    assert_eq!(nps.score, 13);
    assert_eq!(nps.average_score, 7.8);
    assert_eq!(nps.detractor_percent, 25);
}

#[test]
fn test_backend_rows_normalize_like_csv_rows() {
    let from_json: Vec<SurveyRecord> = fixtures::sample_json()
        .iter()
        .map(SurveyRecord::from_json)
        .collect();
    assert_eq!(from_json, fixtures::sample_records());

    let scores: Vec<u8> = from_json.iter().filter_map(|r| r.score).collect();
    assert_eq!(scores, fixtures::SAMPLE_SCORES);
    assert_eq!(from_json[0].response_day(), Some(day(2024, 1, 15)));
}

#[test]
fn test_unparsable_scores_leave_denominator() {
    let mut records = fixtures::sample_records();
    records.push(fixtures::raw_record(&["Store No.", "NPS"], &["5000", "n/a"]));
    records.push(fixtures::raw_record(&["Store No.", "NPS"], &["5001", ""]));

    let nps = compute_nps(&records);
    assert_eq!(nps.total, 8);
    assert_eq!(nps.score, 13);
}

#[test]
fn test_sample_trend_keeps_latest_week() {
    let trend = compute_trend(&fixtures::sample_records(), 7);

    assert_eq!(trend.len(), 7);
    assert_eq!(trend[0].date, day(2024, 1, 16));
    assert_eq!(trend[6].date, day(2024, 1, 22));
    let nps: Vec<i32> = trend.iter().map(|p| p.nps).collect();
    assert_eq!(nps, vec![0, 0, 100, -100, 100, 0, -100]);
    assert!(trend.iter().all(|p| p.response_count == 1));
}

#[test]
fn test_sample_trend_pads_wide_window() {
    let trend = compute_trend(&fixtures::sample_records(), 10);

    assert_eq!(trend.len(), 10);
    assert_eq!(trend[0].date, day(2024, 1, 13));
    assert_eq!(trend[0].response_count, 0);
    assert_eq!(trend[1].response_count, 0);
    assert_eq!(trend[2].date, day(2024, 1, 15));
    assert!(trend.windows(2).all(|w| w[0].date < w[1].date));
}

#[test]
fn test_sample_drivers() {
    let drivers = compute_driver_averages(&fixtures::sample_records(), &default_drivers());

    assert_eq!(drivers.len(), 5);
    assert_eq!(drivers[0].label, "Store Cleanliness");
    assert_eq!(drivers[0].count, 7);
    assert_eq!(drivers[0].average, Some(3.4));
    assert!(drivers[1..].iter().all(|d| d.average.is_none() && d.count == 0));
}

#[test]
fn test_sample_ranking_is_deterministic() {
    let ranking = compute_store_ranking(&fixtures::sample_records(), 5);
    let ids: Vec<&str> = ranking.iter().map(|s| s.store_id.as_str()).collect();

    assert_eq!(ids, vec!["2024", "3019", "3039", "2025", "3018"]);
    assert_eq!(ranking[0].store_name, "Andheri West");
    assert_eq!(ranking[0].nps, 100);
}

#[test]
fn test_filter_by_state_and_dates() {
    let records = fixtures::sample_records();

    let karnataka = filter::apply(&records, &FilterCriteria::all().with_state("Karnataka"));
    assert_eq!(compute_nps(&karnataka).score, 50);

    let mid_week = filter::apply(
        &records,
        &FilterCriteria::all().with_dates(Some(day(2024, 1, 17)), Some(day(2024, 1, 19))),
    );
    let ids: Vec<&str> = mid_week.iter().map(|r| r.store_id.as_str()).collect();
    assert_eq!(ids, vec!["3018", "3019", "3033"]);
    assert_eq!(compute_nps(&mid_week).score, 0);
}

#[test]
fn test_filter_by_category_and_search() {
    let records = fixtures::sample_records();

    let detractors = filter::apply(
        &records,
        &FilterCriteria::all().with_category(NpsCategory::Detractor),
    );
    let ids: Vec<&str> = detractors.iter().map(|r| r.store_id.as_str()).collect();
    assert_eq!(ids, vec!["3033", "4002"]);

    let queue = filter::apply(&records, &FilterCriteria::all().with_search("QUEUE"));
    assert_eq!(queue.len(), 2);
}

#[test]
fn test_filter_all_and_idempotence() {
    let records = fixtures::sample_records();

    assert_eq!(filter::apply(&records, &FilterCriteria::all()), records);

    let criteria = FilterCriteria::all().with_region("South");
    let once = filter::apply(&records, &criteria);
    let twice = filter::apply(&once, &criteria);
    assert_eq!(once, twice);
    assert_eq!(once.len(), 4);
}

#[test]
fn test_region_breakdown() {
    let breakdown = compute_breakdown(&fixtures::sample_records(), Field::Region);
    let rows: Vec<(&str, i32)> = breakdown
        .iter()
        .map(|b| (b.key.as_str(), b.summary.score))
        .collect();
    assert_eq!(rows, vec![("North", -50), ("South", 25), ("West", 50)]);
}

#[test]
fn test_sample_filter_options() {
    let options = filter_options(&fixtures::sample_records());

    assert_eq!(
        options.states,
        vec!["Delhi", "Karnataka", "Maharashtra", "Tamil Nadu"]
    );
    assert_eq!(options.stores.len(), 8);
    assert_eq!(options.date_range.from, Some(day(2024, 1, 15)));
    assert_eq!(options.date_range.to, Some(day(2024, 1, 22)));
}

#[test]
fn test_sample_keywords() {
    let keywords = top_keywords(&fixtures::sample_records(), 3);
    let words: Vec<(&str, usize)> = keywords
        .iter()
        .map(|k| (k.keyword.as_str(), k.count))
        .collect();
    assert_eq!(words, vec![("great", 3), ("long", 2), ("queue", 2)]);
}

#[test]
fn test_dashboard_metrics_bundle() {
    let metrics = AggregateMetrics::compute(&fixtures::sample_records(), &AggregationConfig::default());

    assert_eq!(metrics.nps.score, 13);
    assert_eq!(metrics.trend.len(), 7);
    assert_eq!(metrics.drivers.len(), 5);
    assert_eq!(metrics.top_stores.len(), 5);
}

#[test]
fn test_sample_alerts() {
    let now = day(2024, 1, 22).and_hms_opt(12, 0, 0).unwrap().and_utc();
    let alerts = evaluate_alerts(&fixtures::sample_records(), now, &AlertThresholds::default());

    let kinds: Vec<AlertKind> = alerts.iter().map(|a| a.kind).collect();
    assert_eq!(kinds, vec![AlertKind::CriticalStores, AlertKind::LowResponseRate]);
    assert_eq!(alerts[0].message, "2 stores have NPS below -20");
}
