//! Sync and data source configuration.

use nps_core::{Error, Result, DEFAULT_TOP_STORES, DEFAULT_TREND_WINDOW};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Survey backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SourceConfig {
    /// Base URL the `csv/...` endpoints are resolved against
    #[validate(url)]
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Transport timeout per request
    #[validate(range(min = 1, max = 600))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:3001/api/crawler/".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl SourceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Refresh cadence and dashboard shaping.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SyncConfig {
    /// Seconds between periodic fetches
    #[validate(range(min = 1))]
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Quiet period before a filter change is fetched
    #[validate(range(max = 60000))]
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Trend window in days
    #[validate(range(min = 1, max = 366))]
    #[serde(default = "default_window_days")]
    pub window_days: usize,
    /// Stores shown in the ranking
    #[validate(range(min = 1))]
    #[serde(default = "default_top_stores")]
    pub top_stores: usize,
}

fn default_interval_secs() -> u64 {
    30
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_window_days() -> usize {
    DEFAULT_TREND_WINDOW
}

fn default_top_stores() -> usize {
    DEFAULT_TOP_STORES
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            debounce_ms: default_debounce_ms(),
            window_days: default_window_days(),
            top_stores: default_top_stores(),
        }
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Runs `validator` rules and maps failures to [`Error::Config`].
pub fn validate_config<T: Validate>(config: &T) -> Result<()> {
    config.validate().map_err(|e| Error::config(e.to_string()))
}
