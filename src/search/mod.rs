//! Client for the barnsworthburning search API.
//!
//! One GET per query, no retries, no caching. Every failure mode (network,
//! non-2xx status, bad JSON, schema violation) collapses into `None`; the
//! underlying error goes to the diagnostic log, never into the protocol
//! response.

pub mod format;
pub mod schema;

use serde_json::Value;
use tracing::{debug, error};

use crate::error::Error;
use schema::SearchResultItem;

/// Fixed upstream endpoint; the query is appended as the `q` parameter.
const SEARCH_API_BASE: &str = "https://barnsworthburning.net/api/search";

/// User-Agent sent with every upstream request.
const USER_AGENT: &str = "barnsworthburning-mcp/1.0";

/// Search API client.
pub struct SearchClient {
    client: reqwest::Client,
    base_url: String,
}

impl SearchClient {
    /// Create a client against the production endpoint.
    pub fn new() -> Result<Self, Error> {
        Self::with_base_url(SEARCH_API_BASE)
    }

    /// Create a client with a custom base URL (for tests or mirrors).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, Error> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            base_url: base_url.into(),
        })
    }

    /// Run one search query.
    ///
    /// Returns `None` on any failure; callers cannot distinguish causes.
    pub async fn search(&self, query: &str) -> Option<Vec<SearchResultItem>> {
        match self.try_search(query).await {
            Ok(results) => {
                debug!(query, count = results.len(), "Search succeeded");
                Some(results)
            }
            Err(e) => {
                error!(query, error = %e, "Search failed");
                None
            }
        }
    }

    async fn try_search(&self, query: &str) -> Result<Vec<SearchResultItem>, Error> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", query)])
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UpstreamStatus(status));
        }

        let body: Value = response.json().await?;
        let decoded = schema::decode_results(&body)?;
        Ok(decoded.results)
    }
}
