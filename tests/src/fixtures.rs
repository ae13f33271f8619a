//! Test fixtures and record generators.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use nps_core::SurveyRecord;
use std::collections::BTreeMap;

/// Columns of the canonical sample export.
pub const SAMPLE_HEADER: [&str; 8] = [
    "Store No.",
    "Store Name",
    "State",
    "Region",
    "Response Date",
    "NPS",
    "Store Cleanliness",
    "Comments/feedback",
];

/// The canonical eight-row sample: scores 9,8,7,10,6,9,8,5 over
/// 2024-01-15..=2024-01-22.
pub const SAMPLE_ROWS: [[&str; 8]; 8] = [
    ["2024", "Andheri West", "Maharashtra", "West", "2024-01-15", "9", "5", "Great service and clean aisles"],
    ["2025", "Bandra", "Maharashtra", "West", "2024-01-16", "8", "4", "Good variety"],
    ["3018", "Koramangala", "Karnataka", "South", "2024-01-17", "7", "3", "Checkout queue was long"],
    ["3019", "Indiranagar", "Karnataka", "South", "2024-01-18", "10", "5", "Excellent staff, great service"],
    ["3033", "T Nagar", "Tamil Nadu", "South", "2024-01-19", "6", "2", "Fitting rooms were dirty"],
    ["3039", "Anna Nagar", "Tamil Nadu", "South", "2024-01-20", "9", "4", "Great collection"],
    ["4001", "Connaught Place", "Delhi", "North", "2024-01-21", "8", "", "Okay experience"],
    ["4002", "Saket", "Delhi", "North", "2024-01-22", "5", "1", "Long queue and rude staff"],
];

/// Sample scores, row order.
pub const SAMPLE_SCORES: [u8; 8] = [9, 8, 7, 10, 6, 9, 8, 5];

/// Builds a record from header/value pairs, as a CSV parser would.
pub fn raw_record(header: &[&str], values: &[&str]) -> SurveyRecord {
    let raw: BTreeMap<String, String> = header
        .iter()
        .zip(values)
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    SurveyRecord::from_raw(raw)
}

/// The canonical sample as records.
pub fn sample_records() -> Vec<SurveyRecord> {
    SAMPLE_ROWS
        .iter()
        .map(|row| raw_record(&SAMPLE_HEADER, row))
        .collect()
}

/// The canonical sample as the backend's `csv/filter` JSON rows.
pub fn sample_json() -> Vec<serde_json::Value> {
    SAMPLE_ROWS
        .iter()
        .map(|row| {
            let object: serde_json::Map<String, serde_json::Value> = SAMPLE_HEADER
                .iter()
                .zip(row)
                .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
                .collect();
            serde_json::Value::Object(object)
        })
        .collect()
}

/// `n` records for one store, one per day starting at `start`.
pub fn daily_records(store_id: &str, start: NaiveDate, n: usize, score: u8) -> Vec<SurveyRecord> {
    (0..n)
        .map(|i| {
            let day = start + Duration::days(i as i64);
            SurveyRecord {
                store_id: store_id.to_string(),
                response_date: day
                    .and_hms_opt(12, 0, 0)
                    .map(|dt| Utc.from_utc_datetime(&dt)),
                score: Some(score),
                ..Default::default()
            }
        })
        .collect()
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid fixture date")
}
