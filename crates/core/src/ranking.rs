//! Grouped NPS: per-store ranking and per-dimension breakdowns.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::fields::Field;
use crate::nps::{NpsSummary, NpsTally};
use crate::record::SurveyRecord;

/// Default number of stores returned by [`compute_store_ranking`].
pub const DEFAULT_TOP_STORES: usize = 5;

/// NPS for one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMetrics {
    pub store_id: String,
    pub store_name: String,
    pub nps: i32,
    pub response_count: usize,
    pub promoters: usize,
    pub passives: usize,
    pub detractors: usize,
}

/// Ranks stores by NPS and returns the best `top_n`.
///
/// Ordering: NPS descending, then response count descending, then store id
/// ascending. Records without a resolvable store id are not ranked.
pub fn compute_store_ranking(records: &[SurveyRecord], top_n: usize) -> Vec<StoreMetrics> {
    let mut groups: BTreeMap<&str, (Option<&str>, NpsTally)> = BTreeMap::new();

    for record in records {
        let Some(store_id) = record.resolved(Field::StoreId) else {
            continue;
        };
        let entry = groups.entry(store_id).or_default();
        if entry.0.is_none() {
            entry.0 = record.resolved(Field::StoreName);
        }
        entry.1.add(record);
    }

    let mut stores: Vec<StoreMetrics> = groups
        .into_iter()
        .map(|(store_id, (name, tally))| StoreMetrics {
            store_id: store_id.to_string(),
            store_name: name.unwrap_or(store_id).to_string(),
            nps: tally.score(),
            response_count: tally.total(),
            promoters: tally.promoters,
            passives: tally.passives,
            detractors: tally.detractors,
        })
        .collect();

    stores.sort_by(|a, b| {
        b.nps
            .cmp(&a.nps)
            .then_with(|| b.response_count.cmp(&a.response_count))
            .then_with(|| a.store_id.cmp(&b.store_id))
    });
    stores.truncate(top_n);
    stores
}

/// NPS summary for one value of a grouping field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub key: String,
    pub summary: NpsSummary,
}

/// Groups records by `field` and summarizes each group, sorted by key.
/// Records with no value for the field are grouped under an empty key.
pub fn compute_breakdown(records: &[SurveyRecord], field: Field) -> Vec<Breakdown> {
    let mut groups: BTreeMap<&str, NpsTally> = BTreeMap::new();
    for record in records {
        let key = record.resolved(field).unwrap_or_default();
        groups.entry(key).or_default().add(record);
    }

    groups
        .into_iter()
        .map(|(key, tally)| Breakdown {
            key: key.to_string(),
            summary: tally.summary(),
        })
        .collect()
}
