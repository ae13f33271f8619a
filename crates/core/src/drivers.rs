//! Driver category averages.
//!
//! A driver is a separately rated aspect of the visit (cleanliness, staff,
//! ...). Each definition lists the raw columns that may carry its rating.

use serde::{Deserialize, Serialize};

use crate::fields::resolve;
use crate::nps::round1;
use crate::record::SurveyRecord;

/// A driver label and its column aliases, highest priority first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverDefinition {
    pub label: String,
    pub aliases: Vec<String>,
}

impl DriverDefinition {
    pub fn new<I, S>(label: impl Into<String>, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: label.into(),
            aliases: aliases.into_iter().map(Into::into).collect(),
        }
    }
}

/// Average rating for one driver. `average` is `None` when no record
/// carried a usable rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverAverage {
    pub label: String,
    pub average: Option<f64>,
    pub count: usize,
}

/// The drivers shown on the dashboard by default.
pub fn default_drivers() -> Vec<DriverDefinition> {
    vec![
        DriverDefinition::new(
            "Store Cleanliness",
            ["Store Cleanliness", "Cleanliness", "cleanliness", "Cleanliness Rating"],
        ),
        DriverDefinition::new(
            "Staff Helpfulness",
            ["Staff Helpfulness", "Staff Friendliness", "Staff", "staff_rating"],
        ),
        DriverDefinition::new(
            "Product Availability",
            ["Product Availability", "Availability", "Stock Availability"],
        ),
        DriverDefinition::new(
            "Checkout Speed",
            ["Checkout Speed", "Billing Speed", "Checkout", "Wait Time Rating"],
        ),
        DriverDefinition::new("Store Layout", ["Store Layout", "Layout", "Ambience"]),
    ]
}

/// Averages each driver over `records`, in definition order.
pub fn compute_driver_averages(
    records: &[SurveyRecord],
    drivers: &[DriverDefinition],
) -> Vec<DriverAverage> {
    drivers
        .iter()
        .map(|driver| {
            let aliases: Vec<&str> = driver.aliases.iter().map(String::as_str).collect();

            let (sum, count) = records
                .iter()
                .filter_map(|r| resolve(&r.raw, &aliases))
                .filter_map(parse_rating)
                .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

            DriverAverage {
                label: driver.label.clone(),
                average: (count > 0).then(|| round1(sum / count as f64)),
                count,
            }
        })
        .collect()
}

fn parse_rating(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
