//! Survey record types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::fields::{resolve, Field};
use crate::parse::{parse_date, parse_score};

/// Minimum score counted as a promoter.
pub const PROMOTER_MIN_SCORE: u8 = 9;

/// Maximum score counted as a detractor.
pub const DETRACTOR_MAX_SCORE: u8 = 6;

/// NPS classification of a single response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NpsCategory {
    Promoter,
    Passive,
    Detractor,
}

impl NpsCategory {
    pub fn from_score(score: u8) -> Self {
        if score >= PROMOTER_MIN_SCORE {
            Self::Promoter
        } else if score <= DETRACTOR_MAX_SCORE {
            Self::Detractor
        } else {
            Self::Passive
        }
    }
}

/// One customer response.
///
/// `raw` holds the columns exactly as ingested and is never rewritten. The
/// other fields are the normalized view derived from it; an empty string
/// means unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyRecord {
    #[serde(default)]
    pub store_id: String,
    #[serde(default)]
    pub store_name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub response_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub raw: BTreeMap<String, String>,
}

impl SurveyRecord {
    /// Builds a record from raw columns, deriving the normalized fields
    /// through the alias table.
    pub fn from_raw(raw: BTreeMap<String, String>) -> Self {
        let text = |field: Field| resolve(&raw, field.aliases()).unwrap_or_default().to_string();

        Self {
            store_id: text(Field::StoreId),
            store_name: text(Field::StoreName),
            state: text(Field::State),
            region: text(Field::Region),
            city: text(Field::City),
            response_date: resolve(&raw, Field::ResponseDate.aliases()).and_then(parse_date),
            score: resolve(&raw, Field::Score.aliases()).and_then(parse_score),
            comment: resolve(&raw, Field::Comment.aliases()).map(str::to_string),
            raw,
        }
    }

    /// Builds a record from a JSON object as returned by the backend.
    ///
    /// Strings are kept as-is, numbers and booleans are stringified, nested
    /// values are kept as compact JSON text and nulls are dropped. Anything
    /// other than an object yields an empty record.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let raw = match value.as_object() {
            Some(map) => map
                .iter()
                .filter_map(|(k, v)| json_scalar(v).map(|s| (k.clone(), s)))
                .collect(),
            None => BTreeMap::new(),
        };
        Self::from_raw(raw)
    }

    /// Resolves a text field, falling back to the raw aliases when the
    /// normalized value is missing.
    pub fn resolved(&self, field: Field) -> Option<&str> {
        let normalized = match field {
            Field::StoreId => self.store_id.as_str(),
            Field::StoreName => self.store_name.as_str(),
            Field::State => self.state.as_str(),
            Field::Region => self.region.as_str(),
            Field::City => self.city.as_str(),
            Field::Comment => self.comment.as_deref().unwrap_or_default(),
            Field::ResponseDate | Field::Score | Field::Category => "",
        };

        if !normalized.trim().is_empty() {
            return Some(normalized);
        }
        resolve(&self.raw, field.aliases())
    }

    /// Response timestamp, parsed from the raw columns when not normalized.
    pub fn resolved_date(&self) -> Option<DateTime<Utc>> {
        self.response_date
            .or_else(|| resolve(&self.raw, Field::ResponseDate.aliases()).and_then(parse_date))
    }

    /// Calendar day of the response.
    pub fn response_day(&self) -> Option<NaiveDate> {
        self.resolved_date().map(|dt| dt.date_naive())
    }

    /// Satisfaction score, parsed from the raw columns when not normalized.
    pub fn resolved_score(&self) -> Option<u8> {
        self.score
            .or_else(|| resolve(&self.raw, Field::Score.aliases()).and_then(parse_score))
    }

    pub fn category(&self) -> Option<NpsCategory> {
        self.resolved_score().map(NpsCategory::from_score)
    }
}

fn json_scalar(value: &serde_json::Value) -> Option<String> {
    use serde_json::Value;

    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}
