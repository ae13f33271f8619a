//! Distinct filter values present in a record set.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::fields::Field;
use crate::record::SurveyRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOption {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Values a UI can offer as filter choices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub states: Vec<String>,
    pub regions: Vec<String>,
    pub cities: Vec<String>,
    pub stores: Vec<StoreOption>,
    pub date_range: DateRange,
}

/// Collects sorted distinct values for every filter dimension.
pub fn filter_options(records: &[SurveyRecord]) -> FilterOptions {
    let distinct = |field: Field| -> Vec<String> {
        records
            .iter()
            .filter_map(|r| r.resolved(field))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    };

    let mut stores: BTreeMap<&str, &str> = BTreeMap::new();
    for record in records {
        if let Some(code) = record.resolved(Field::StoreId) {
            let name = record.resolved(Field::StoreName).unwrap_or(code);
            stores.entry(code).or_insert(name);
        }
    }

    let days = records.iter().filter_map(SurveyRecord::response_day);
    let date_range = days.fold(DateRange::default(), |range, day| DateRange {
        from: Some(range.from.map_or(day, |f| f.min(day))),
        to: Some(range.to.map_or(day, |t| t.max(day))),
    });

    FilterOptions {
        states: distinct(Field::State),
        regions: distinct(Field::Region),
        cities: distinct(Field::City),
        stores: stores
            .into_iter()
            .map(|(code, name)| StoreOption {
                code: code.to_string(),
                name: name.to_string(),
            })
            .collect(),
        date_range,
    }
}
