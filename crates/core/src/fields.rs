//! Column alias table.
//!
//! Survey exports name the same column many different ways. Every lookup of
//! a logical field against raw columns goes through [`Field::aliases`], so the
//! filter and aggregation code always agree on where a value comes from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A logical survey field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    StoreId,
    StoreName,
    State,
    Region,
    City,
    ResponseDate,
    Score,
    Comment,
    Category,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::StoreId,
        Field::StoreName,
        Field::State,
        Field::Region,
        Field::City,
        Field::ResponseDate,
        Field::Score,
        Field::Comment,
        Field::Category,
    ];

    /// Raw column names for this field, highest priority first.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::StoreId => &[
                "storeCode",
                "Store No.",
                "Store No",
                "Store Code",
                "StoreCode",
                "Store_Code",
                "StoreNo",
                "Store ID",
                "StoreID",
                "Store_ID",
                "Store Number",
                "StoreNumber",
                "Outlet Code",
                "Location Code",
                "Store",
                "Outlet",
            ],
            Self::StoreName => &[
                "storeName",
                "Store Name",
                "StoreName",
                "Store_Name",
                "Store Franchise",
                "Outlet Name",
                "OutletName",
                "Store",
                "Outlet",
                "Place Of Business",
            ],
            Self::State => &["state", "State", "STATE", "Location State", "Store State", "State Name"],
            Self::Region => &["region", "Region", "REGION", "Zone", "Cluster", "Area", "Territory", "Region Code"],
            Self::City => &["city", "City", "CITY", "Store City", "Town", "Location"],
            Self::ResponseDate => &[
                "responseDate",
                "Response Date",
                "ResponseDate",
                "Response_Date",
                "Survey Date",
                "Submission Date",
                "Submission Time",
                "Date Submitted",
                "Created Date",
                "Created At",
                "Response Time",
                "Timestamp",
                "Date",
            ],
            Self::Score => &[
                "npsScore",
                "NPS Score",
                "NPS_Score",
                "NPS",
                "Likelihood to Recommend",
                "On a scale of 0 to 10, with 0 being the lowest and 10 being the highest rating - how likely are you to recommend Trends to friends and family",
                "Overall Rating",
                "Customer Rating",
                "Rating",
                "Score",
            ],
            Self::Comment => &[
                "comments",
                "Comments",
                "Comments/feedback",
                "Feedback",
                "Customer Comments",
                "Any other feedback?",
                "Remark",
                "Observation",
                "Review",
            ],
            Self::Category => &["category", "Category", "Department", "Segment", "Feedback Type"],
        }
    }
}

/// Resolve the first non-empty value among `aliases` in a raw column map.
///
/// Exact column names win over case-insensitive matches, so a file carrying
/// both `Region` and `REGION` resolves predictably.
pub fn resolve<'a>(raw: &'a BTreeMap<String, String>, aliases: &[&str]) -> Option<&'a str> {
    for alias in aliases {
        if let Some(v) = raw.get(*alias).map(|v| v.trim()).filter(|v| !v.is_empty()) {
            return Some(v);
        }
    }

    for alias in aliases {
        let wanted = alias.trim();
        let found = raw
            .iter()
            .find(|(k, v)| k.trim().eq_ignore_ascii_case(wanted) && !v.trim().is_empty());
        if let Some((_, v)) = found {
            return Some(v.trim());
        }
    }

    None
}
