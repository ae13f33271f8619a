//! Filter criteria and the filter engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fields::Field;
use crate::record::{NpsCategory, SurveyRecord};

/// Sentinel meaning "no constraint" for string dimensions.
pub const ALL: &str = "all";

/// A user-selected view constraint.
///
/// Every dimension is optional; an absent value, a blank string or the
/// [`ALL`] sentinel leaves that dimension unconstrained. Other values are
/// compared exactly, surrounding whitespace included. Date bounds are
/// inclusive calendar days.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nps_category: Option<NpsCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_text: Option<String>,
}

impl FilterCriteria {
    /// Criteria that match everything.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_dates(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    pub fn with_store(mut self, store_code: impl Into<String>) -> Self {
        self.store_code = Some(store_code.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_category(mut self, category: NpsCategory) -> Self {
        self.nps_category = Some(category);
        self
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }

    /// Whether no dimension is constrained.
    pub fn is_unconstrained(&self) -> bool {
        self.date_from.is_none()
            && self.date_to.is_none()
            && self.nps_category.is_none()
            && [
                &self.store_code,
                &self.state,
                &self.region,
                &self.city,
                &self.search_text,
            ]
            .into_iter()
            .all(|v| constraint(v).is_none())
    }

    /// Whether a single record passes every dimension.
    pub fn matches(&self, record: &SurveyRecord) -> bool {
        self.matches_dates(record)
            && matches_exact(record, Field::StoreId, &self.store_code)
            && matches_exact(record, Field::State, &self.state)
            && matches_exact(record, Field::Region, &self.region)
            && matches_exact(record, Field::City, &self.city)
            && self.matches_category(record)
            && self.matches_search(record)
    }

    fn matches_dates(&self, record: &SurveyRecord) -> bool {
        if self.date_from.is_none() && self.date_to.is_none() {
            return true;
        }

        let Some(day) = record.response_day() else {
            return false;
        };

        self.date_from.map_or(true, |from| day >= from) && self.date_to.map_or(true, |to| day <= to)
    }

    fn matches_category(&self, record: &SurveyRecord) -> bool {
        match self.nps_category {
            None => true,
            Some(wanted) => record.category() == Some(wanted),
        }
    }

    fn matches_search(&self, record: &SurveyRecord) -> bool {
        let Some(needle) = constraint(&self.search_text) else {
            return true;
        };
        let needle = needle.to_lowercase();

        record
            .raw
            .values()
            .chain(record.comment.iter())
            .any(|v| v.to_lowercase().contains(&needle))
    }
}

/// Returns the records matching `criteria`, preserving input order.
pub fn apply(records: &[SurveyRecord], criteria: &FilterCriteria) -> Vec<SurveyRecord> {
    if criteria.is_unconstrained() {
        return records.to_vec();
    }

    records
        .iter()
        .filter(|r| criteria.matches(r))
        .cloned()
        .collect()
}

fn constraint(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty() && *v != ALL)
}

fn matches_exact(record: &SurveyRecord, field: Field, wanted: &Option<String>) -> bool {
    match constraint(wanted) {
        None => true,
        Some(wanted) => record.resolved(field) == Some(wanted),
    }
}
