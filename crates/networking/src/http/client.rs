//! Google Sheets query (gviz) HTTP client

use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL, PRAGMA},
    Client,
};
use sheetfolio_core::{DashboardConfig, Error, Result};
use std::time::Duration;
use tracing::{debug, error, instrument};

const USER_AGENT_VALUE: &str = concat!("sheetfolio/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the public-sheet query endpoint
///
/// Always asks for a fresh copy: the endpoint sits behind caches that would
/// otherwise serve minutes-old data.
pub struct SheetsClient {
    http: Client,
    base_url: String,
    sheet_id: String,
}

impl SheetsClient {
    /// Create a client for the sheet configured in `config`
    pub fn new(config: &DashboardConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT_VALUE)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::NetworkError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            sheet_id: config.sheet_id.clone(),
        })
    }

    /// Endpoint path without the query string
    pub fn query_endpoint(&self) -> String {
        format!("{}/spreadsheets/d/{}/gviz/tq", self.base_url, self.sheet_id)
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(
            CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        );
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        headers
    }

    /// Fetch the raw response body for one tab
    ///
    /// The body still carries the `setResponse(...)` wrapper; unwrapping is
    /// the parser's job.
    #[instrument(skip(self))]
    pub async fn fetch_sheet(&self, sheet_name: &str) -> Result<String> {
        let url = self.query_endpoint();
        debug!("Fetching sheet {} from {}", sheet_name, url);

        let response = self
            .http
            .get(&url)
            .query(&[("tqx", "out:json"), ("sheet", sheet_name)])
            .headers(Self::default_headers())
            .send()
            .await?;

        debug!("Response status: {}", response.status());

        let response = response.error_for_status().map_err(|e| {
            error!("Sheet request failed: {}", e);
            Error::ApiError(e.to_string())
        })?;

        let text = response.text().await.map_err(|e| {
            error!("Failed to read sheet body: {}", e);
            Error::NetworkError(e.to_string())
        })?;

        debug!("Received {} bytes for {}", text.len(), sheet_name);
        Ok(text)
    }
}
