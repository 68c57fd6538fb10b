//! Exa search API client.
//!
//! Minimal client for the Exa `/search` endpoint: JSON POST with an
//! `x-api-key` header. The API key is read from the environment variable
//! named in the config; it is never stored in the config file itself.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use pcfharvest_shared::{HarvestError, Result, SearchConfig};

use crate::{SearchHit, SearchProvider};

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("pcfharvest/", env!("CARGO_PKG_VERSION"));

/// Timeout for search requests.
const SEARCH_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Serialize)]
struct ExaRequest<'a> {
    query: &'a str,
    #[serde(rename = "numResults")]
    num_results: usize,
}

#[derive(Debug, Deserialize)]
struct ExaResponse {
    #[serde(default)]
    results: Vec<ExaResult>,
}

#[derive(Debug, Deserialize)]
struct ExaResult {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: Option<String>,
}

// ---------------------------------------------------------------------------
// ExaClient
// ---------------------------------------------------------------------------

/// Production [`SearchProvider`] backed by the Exa search API.
pub struct ExaClient {
    client: Client,
    endpoint: String,
    api_key: String,
    num_results: usize,
}

impl ExaClient {
    /// Build a client with explicit parameters.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, num_results: usize) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(SEARCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| HarvestError::Search(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            num_results,
        })
    }

    /// Build a client from config, reading the API key from the configured
    /// environment variable.
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                HarvestError::config(format!(
                    "search API key not found. Set the {} environment variable.",
                    config.api_key_env
                ))
            })?;

        Self::new(config.endpoint.clone(), api_key, config.results_per_query)
    }
}

impl SearchProvider for ExaClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let request = ExaRequest {
            query,
            num_results: self.num_results,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| HarvestError::Search(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Search(format!(
                "{}: HTTP {status}",
                self.endpoint
            )));
        }

        let parsed: ExaResponse = response
            .json()
            .await
            .map_err(|e| HarvestError::Search(format!("malformed search response: {e}")))?;

        debug!(results = parsed.results.len(), "search response parsed");

        Ok(parsed
            .results
            .into_iter()
            .filter(|r| !r.url.is_empty())
            .map(|r| SearchHit {
                url: r.url,
                title: r.title.unwrap_or_default(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn parses_results() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "results": [
                {"url": "https://example.com/pcf/laptop-1.pdf", "title": "Laptop 1 PCF"},
                {"url": "https://example.com/pcf/laptop-2.pdf", "title": null},
                {"url": ""}
            ]
        });

        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("x-api-key", "test-key"))
            .and(body_partial_json(serde_json::json!({"numResults": 30})))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;

        let client = ExaClient::new(format!("{}/search", server.uri()), "test-key", 30).unwrap();
        let hits = client.search("site:example.com filetype:pdf laptop").await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://example.com/pcf/laptop-1.pdf");
        assert_eq!(hits[0].title, "Laptop 1 PCF");
        assert_eq!(hits[1].title, "");
    }

    #[tokio::test]
    async fn api_error_is_search_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = ExaClient::new(format!("{}/search", server.uri()), "bad-key", 10).unwrap();
        let result = client.search("anything").await;

        assert!(matches!(result, Err(HarvestError::Search(_))));
    }

    #[test]
    fn from_config_requires_env_var() {
        let config = SearchConfig {
            api_key_env: "PCFHARVEST_TEST_MISSING_KEY".into(),
            ..Default::default()
        };
        let result = ExaClient::from_config(&config);
        assert!(result.is_err());
    }
}
