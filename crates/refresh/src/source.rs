//! Survey data sources.
//!
//! The coordinator only sees the [`DataSource`] trait. [`HttpDataSource`]
//! talks to the survey backend:
//!
//! - `GET  {base}/csv/current-data` answers `{success, hasData}`
//! - `POST {base}/csv/filter` takes `{"filters": FilterCriteria}` and answers
//!   `{success, data: [record, ...], aggregates}`

use async_trait::async_trait;
use nps_core::{Error, FilterCriteria, Result, SurveyRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::SourceConfig;

const AVAILABILITY_PATH: &str = "csv/current-data";
const FILTER_PATH: &str = "csv/filter";

/// Answer of the availability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub has_data: bool,
}

/// Anything that can produce the current record set for a filter.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Asks whether the backend currently holds any data.
    async fn check_availability(&self) -> Result<Availability>;

    /// Fetches the records matching `criteria`.
    async fn fetch(&self, criteria: &FilterCriteria) -> Result<Vec<SurveyRecord>>;
}

#[derive(Serialize)]
struct FilterRequest<'a> {
    filters: &'a FilterCriteria,
}

#[derive(Deserialize)]
struct FilterResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<Vec<Value>>,
    #[serde(default)]
    error: Option<String>,
}

/// Parses a `csv/filter` response body into records.
pub(crate) fn parse_filter_response(body: &str) -> Result<Vec<SurveyRecord>> {
    let response: FilterResponse = serde_json::from_str(body)?;
    if !response.success {
        return Err(Error::backend(
            response
                .error
                .unwrap_or_else(|| "filter request unsuccessful".to_string()),
        ));
    }
    let rows = response
        .data
        .ok_or_else(|| Error::backend("filter response carried no data"))?;
    Ok(rows.iter().map(SurveyRecord::from_json).collect())
}

/// Survey backend over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDataSource {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpDataSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| Error::config(format!("invalid base_url '{}': {}", config.base_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::internal(format!("cannot build URL for {}: {}", path, e)))
    }

    async fn read_body(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::fetch(Some(status.as_u16()), format!("reading body: {}", e)))?;
        if !status.is_success() {
            warn!(status = %status, body = %body, "Survey backend returned error");
            return Err(Error::fetch(
                Some(status.as_u16()),
                format!("backend returned {}", status),
            ));
        }
        Ok(body)
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    Error::fetch(e.status().map(|s| s.as_u16()), e.to_string())
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn check_availability(&self) -> Result<Availability> {
        let url = self.endpoint(AVAILABILITY_PATH)?;
        debug!(url = %url, "Checking data availability");

        let response = self.client.get(url).send().await.map_err(transport_error)?;
        let body = Self::read_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn fetch(&self, criteria: &FilterCriteria) -> Result<Vec<SurveyRecord>> {
        let url = self.endpoint(FILTER_PATH)?;
        debug!(url = %url, unconstrained = criteria.is_unconstrained(), "Fetching records");

        let response = self
            .client
            .post(url)
            .json(&FilterRequest { filters: criteria })
            .send()
            .await
            .map_err(transport_error)?;
        let body = Self::read_body(response).await?;
        parse_filter_response(&body)
    }
}
