//! Rule-based alerts over a filtered view.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::fields::Field;
use crate::nps::{compute_nps, NpsTally};
use crate::record::SurveyRecord;

/// How urgently an alert needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Critical,
    Warning,
    Info,
}

/// Which rule raised an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertKind {
    NegativeNps,
    HighDetractorRate,
    CriticalStores,
    DecliningTrend,
    LowResponseRate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
    pub actionable: bool,
}

/// Limits for [`evaluate_alerts`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// Overall NPS below this is critical.
    pub min_nps: i32,
    /// Detractor share (percent) above this is critical.
    pub max_detractor_percent: u32,
    /// A store with NPS below this needs attention.
    pub min_store_nps: i32,
    /// Days counted as recent for the decline check.
    pub recent_days: i64,
    /// Recent responses needed before the decline check runs.
    pub min_recent_responses: usize,
    /// NPS points recent data may trail the overall score by.
    pub max_recent_decline: i32,
    /// Average responses per store below this is reported.
    pub min_responses_per_store: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            min_nps: 0,
            max_detractor_percent: 40,
            min_store_nps: -20,
            recent_days: 7,
            min_recent_responses: 10,
            max_recent_decline: 10,
            min_responses_per_store: 5.0,
        }
    }
}

/// Evaluates every rule against `records` as of `now`, in a fixed order:
/// negative NPS, detractor rate, critical stores, recent decline, response
/// volume. An empty subset raises nothing.
pub fn evaluate_alerts(
    records: &[SurveyRecord],
    now: DateTime<Utc>,
    thresholds: &AlertThresholds,
) -> Vec<Alert> {
    if records.is_empty() {
        return Vec::new();
    }

    let mut alerts = Vec::new();
    let overall = compute_nps(records);

    if overall.total > 0 && overall.score < thresholds.min_nps {
        alerts.push(Alert {
            kind: AlertKind::NegativeNps,
            severity: AlertSeverity::Critical,
            message: format!(
                "Overall NPS is {}: detractors outnumber promoters",
                overall.score
            ),
            actionable: true,
        });
    }

    if overall.detractor_percent > thresholds.max_detractor_percent {
        alerts.push(Alert {
            kind: AlertKind::HighDetractorRate,
            severity: AlertSeverity::Critical,
            message: format!("{}% of respondents are detractors", overall.detractor_percent),
            actionable: true,
        });
    }

    let mut stores: BTreeMap<&str, NpsTally> = BTreeMap::new();
    for record in records {
        if let Some(store) = record.resolved(Field::StoreId) {
            stores.entry(store).or_default().add(record);
        }
    }
    let critical = stores
        .values()
        .filter(|tally| tally.total() > 0 && tally.score() < thresholds.min_store_nps)
        .count();
    if critical > 0 {
        let noun = if critical == 1 { "store has" } else { "stores have" };
        alerts.push(Alert {
            kind: AlertKind::CriticalStores,
            severity: AlertSeverity::Warning,
            message: format!(
                "{critical} {noun} NPS below {}",
                thresholds.min_store_nps
            ),
            actionable: true,
        });
    }

    let recent_from = now - Duration::days(thresholds.recent_days);
    let recent: Vec<&SurveyRecord> = records
        .iter()
        .filter(|r| r.resolved_date().is_some_and(|at| at >= recent_from))
        .collect();
    if recent.len() > thresholds.min_recent_responses {
        let tally: NpsTally = recent.into_iter().collect();
        if tally.total() > 0 && tally.score() < overall.score - thresholds.max_recent_decline {
            alerts.push(Alert {
                kind: AlertKind::DecliningTrend,
                severity: AlertSeverity::Warning,
                message: format!(
                    "Recent NPS {} trails the overall {}",
                    tally.score(),
                    overall.score
                ),
                actionable: true,
            });
        }
    }

    // Records without a store id count as one more store.
    let distinct: HashSet<Option<&str>> =
        records.iter().map(|r| r.resolved(Field::StoreId)).collect();
    let per_store = records.len() as f64 / distinct.len().max(1) as f64;
    if per_store < thresholds.min_responses_per_store {
        alerts.push(Alert {
            kind: AlertKind::LowResponseRate,
            severity: AlertSeverity::Info,
            message: format!("Only {per_store:.1} responses per store"),
            actionable: false,
        });
    }

    alerts
}
