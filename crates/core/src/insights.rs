//! Anomaly detection, period-over-period drops, comment keywords and
//! weakest categories.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::fields::Field;
use crate::nps::{NpsSummary, NpsTally};
use crate::record::SurveyRecord;

/// Default |z| at which a store-day counts as anomalous.
pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 2.0;

/// Length of each comparison window in [`detect_benchmark_drops`].
pub const BENCHMARK_WINDOW_DAYS: i64 = 30;

/// Responses each window needs before a drop is reported.
pub const BENCHMARK_MIN_RESPONSES: usize = 20;

/// NPS points a group must lose to be reported.
pub const BENCHMARK_MIN_DROP: i32 = 10;

/// Default number of categories returned by [`worst_categories`].
pub const DEFAULT_WORST_CATEGORIES: usize = 5;

/// Dimensions compared by [`detect_benchmark_drops`], in report order.
const BENCHMARK_DIMENSIONS: [Field; 3] = [Field::StoreId, Field::State, Field::Region];

/// Minimum keyword length.
const MIN_KEYWORD_LEN: usize = 4;

/// A store-day whose NPS deviates from that store's daily mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub store_id: String,
    pub day: NaiveDate,
    pub nps: i32,
    pub z: f64,
}

/// Flags store-days whose NPS z-score against the store's own daily series
/// reaches `threshold`. Stores with constant daily NPS never flag.
pub fn detect_anomalies(records: &[SurveyRecord], threshold: f64) -> Vec<Anomaly> {
    let mut by_store: BTreeMap<&str, BTreeMap<NaiveDate, NpsTally>> = BTreeMap::new();
    for record in records {
        let (Some(store), Some(day)) = (record.resolved(Field::StoreId), record.response_day())
        else {
            continue;
        };
        by_store
            .entry(store)
            .or_default()
            .entry(day)
            .or_default()
            .add(record);
    }

    let mut anomalies = Vec::new();
    for (store, days) in by_store {
        let series: Vec<(NaiveDate, i32)> = days
            .into_iter()
            .filter(|(_, tally)| tally.total() > 0)
            .map(|(day, tally)| (day, tally.score()))
            .collect();
        if series.is_empty() {
            continue;
        }

        let n = series.len() as f64;
        let mean = series.iter().map(|(_, nps)| f64::from(*nps)).sum::<f64>() / n;
        let variance = series
            .iter()
            .map(|(_, nps)| (f64::from(*nps) - mean).powi(2))
            .sum::<f64>()
            / n;
        let sd = variance.sqrt();
        if sd == 0.0 {
            continue;
        }

        for (day, nps) in series {
            let z = (f64::from(nps) - mean) / sd;
            if z.abs() >= threshold {
                anomalies.push(Anomaly {
                    store_id: store.to_string(),
                    day,
                    nps,
                    z: (z * 100.0).round() / 100.0,
                });
            }
        }
    }

    anomalies
}

/// A store, state or region whose NPS fell between the previous and the
/// latest comparison window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkDrop {
    pub dimension: Field,
    pub key: String,
    pub current_nps: i32,
    pub previous_nps: i32,
    pub delta: i32,
    pub current_responses: usize,
}

/// Compares the last [`BENCHMARK_WINDOW_DAYS`] days before `now` with the
/// window before that, per store, state and region.
///
/// The current window is `[now - 30d, now]`, the previous one
/// `[now - 60d, now - 30d)`. A group is reported when both windows hold at
/// least [`BENCHMARK_MIN_RESPONSES`] scored responses and NPS fell by
/// [`BENCHMARK_MIN_DROP`] or more. Output is ordered by dimension, then key.
pub fn detect_benchmark_drops(records: &[SurveyRecord], now: DateTime<Utc>) -> Vec<BenchmarkDrop> {
    let window = Duration::days(BENCHMARK_WINDOW_DAYS);
    let current_from = now - window;
    let previous_from = current_from - window;

    let mut drops = Vec::new();
    for dimension in BENCHMARK_DIMENSIONS {
        let mut groups: BTreeMap<&str, (NpsTally, NpsTally)> = BTreeMap::new();
        for record in records {
            let (Some(key), Some(at)) = (record.resolved(dimension), record.resolved_date()) else {
                continue;
            };
            let entry = groups.entry(key).or_default();
            if at >= current_from && at <= now {
                entry.0.add(record);
            } else if at >= previous_from && at < current_from {
                entry.1.add(record);
            }
        }

        for (key, (current, previous)) in groups {
            let enough = |tally: &NpsTally| tally.total() >= BENCHMARK_MIN_RESPONSES;
            if !enough(&current) || !enough(&previous) {
                continue;
            }
            let delta = current.score() - previous.score();
            if delta <= -BENCHMARK_MIN_DROP {
                drops.push(BenchmarkDrop {
                    dimension,
                    key: key.to_string(),
                    current_nps: current.score(),
                    previous_nps: previous.score(),
                    delta,
                    current_responses: current.total(),
                });
            }
        }
    }

    drops
}

/// A word and how many times it appeared in comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub keyword: String,
    pub count: usize,
}

/// Most frequent comment words (lowercase alphabetic, at least four
/// letters). Ties are ordered alphabetically.
pub fn top_keywords(records: &[SurveyRecord], n: usize) -> Vec<Keyword> {
    let mut bag: HashMap<String, usize> = HashMap::new();

    for comment in records.iter().filter_map(|r| r.resolved(Field::Comment)) {
        let lower = comment.to_lowercase();
        for word in lower
            .split(|c: char| !c.is_ascii_alphabetic())
            .filter(|w| w.len() >= MIN_KEYWORD_LEN)
        {
            *bag.entry(word.to_string()).or_default() += 1;
        }
    }

    let mut keywords: Vec<Keyword> = bag
        .into_iter()
        .map(|(keyword, count)| Keyword { keyword, count })
        .collect();
    keywords.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.keyword.cmp(&b.keyword)));
    keywords.truncate(n);
    keywords
}

/// NPS for one feedback category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: String,
    pub summary: NpsSummary,
}

/// The `n` categories with the lowest NPS, worst first; ties by name.
/// Records without a category, and categories with no scored response, are
/// left out.
pub fn worst_categories(records: &[SurveyRecord], n: usize) -> Vec<CategoryScore> {
    let mut groups: BTreeMap<&str, NpsTally> = BTreeMap::new();
    for record in records {
        if let Some(category) = record.resolved(Field::Category) {
            groups.entry(category).or_default().add(record);
        }
    }

    let mut categories: Vec<CategoryScore> = groups
        .into_iter()
        .filter(|(_, tally)| tally.total() > 0)
        .map(|(category, tally)| CategoryScore {
            category: category.to_string(),
            summary: tally.summary(),
        })
        .collect();
    // Stable: equal scores stay in key order.
    categories.sort_by_key(|c| c.summary.score);
    categories.truncate(n);
    categories
}
