//! Daily NPS trend.

use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::nps::NpsTally;
use crate::record::SurveyRecord;

/// Default trailing window in days.
pub const DEFAULT_TREND_WINDOW: usize = 7;

/// NPS for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub nps: i32,
    pub response_count: usize,
}

impl TrendPoint {
    fn placeholder(date: NaiveDate) -> Self {
        Self {
            date,
            nps: 0,
            response_count: 0,
        }
    }
}

/// Groups records by day and returns exactly `window_days` points in
/// ascending date order.
///
/// The most recent `window_days` days with at least one scored response are
/// kept; days whose scores are all unparsable take no slot. When fewer
/// days exist, zero-valued placeholders for the days immediately before the
/// earliest kept day are prepended. With no dated records at all, the window
/// ends today (UTC).
pub fn compute_trend(records: &[SurveyRecord], window_days: usize) -> Vec<TrendPoint> {
    compute_trend_ending(records, window_days, Utc::now().date_naive())
}

/// Like [`compute_trend`] but anchors an empty window on `today`.
pub fn compute_trend_ending(
    records: &[SurveyRecord],
    window_days: usize,
    today: NaiveDate,
) -> Vec<TrendPoint> {
    if window_days == 0 {
        return Vec::new();
    }

    let mut days: BTreeMap<NaiveDate, NpsTally> = BTreeMap::new();
    for record in records {
        if let Some(day) = record.response_day() {
            days.entry(day).or_default().add(record);
        }
    }

    let mut points: Vec<TrendPoint> = days
        .iter()
        .rev()
        .filter(|(_, tally)| tally.total() > 0)
        .take(window_days)
        .map(|(date, tally)| TrendPoint {
            date: *date,
            nps: tally.score(),
            response_count: tally.total(),
        })
        .collect();
    points.reverse();

    let missing = window_days - points.len();
    if missing > 0 {
        let first_padded = match points.first() {
            Some(earliest) => earliest.date.checked_sub_days(Days::new(missing as u64)),
            None => today.checked_sub_days(Days::new(window_days as u64 - 1)),
        };

        let mut padded = first_padded
            .map(|start| {
                start
                    .iter_days()
                    .take(missing)
                    .map(TrendPoint::placeholder)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_else(|| vec![TrendPoint::placeholder(NaiveDate::MIN); missing]);

        padded.extend(points);
        points = padded;
    }

    points
}
