//! Dashboard-level aggregate over a record subset.

use serde::{Deserialize, Serialize};

use crate::drivers::{compute_driver_averages, default_drivers, DriverAverage, DriverDefinition};
use crate::nps::{compute_nps, NpsSummary};
use crate::ranking::{compute_store_ranking, StoreMetrics, DEFAULT_TOP_STORES};
use crate::record::SurveyRecord;
use crate::trend::{compute_trend, TrendPoint, DEFAULT_TREND_WINDOW};

/// Parameters for [`AggregateMetrics::compute`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    pub window_days: usize,
    pub top_stores: usize,
    pub drivers: Vec<DriverDefinition>,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_TREND_WINDOW,
            top_stores: DEFAULT_TOP_STORES,
            drivers: default_drivers(),
        }
    }
}

/// Everything the dashboard shows for one filtered view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateMetrics {
    pub nps: NpsSummary,
    pub trend: Vec<TrendPoint>,
    pub drivers: Vec<DriverAverage>,
    pub top_stores: Vec<StoreMetrics>,
}

impl AggregateMetrics {
    pub fn compute(records: &[SurveyRecord], config: &AggregationConfig) -> Self {
        Self {
            nps: compute_nps(records),
            trend: compute_trend(records, config.window_days),
            drivers: compute_driver_averages(records, &config.drivers),
            top_stores: compute_store_ranking(records, config.top_stores),
        }
    }
}
