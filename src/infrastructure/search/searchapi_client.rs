use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::application::ports::{SearchHit, WebSearch};
use crate::config::{SearchConfig, Secret};
use crate::error::{GradingError, UpstreamError};

const SERVICE: &str = "SearchAPI";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic_results: Vec<SearchHit>,
}

/// Google web search through searchapi.io
#[derive(Clone)]
pub struct SearchApiClient {
    client: Client,
    api_url: String,
    api_key: Secret,
    num: u8,
}

impl SearchApiClient {
    /// `None` when no search key is configured; novelty then relies on GitHub alone
    pub fn from_config(config: &SearchConfig, timeout: Duration, num: u8) -> Result<Option<Self>> {
        let Some(api_key) = config.api_key.clone() else {
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create search HTTP client")?;

        Ok(Some(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            num,
        }))
    }
}

#[async_trait]
impl WebSearch for SearchApiClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, GradingError> {
        let num = self.num.to_string();
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("hl", "en"),
                ("gl", "us"),
                ("num", num.as_str()),
                ("api_key", self.api_key.expose()),
            ])
            .send()
            .await
            .map_err(UpstreamError::transport(SERVICE))?;

        let body: SearchResponse = UpstreamError::check(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(|e| UpstreamError::Decode {
                service: SERVICE,
                detail: e.to_string(),
            })?;

        Ok(body
            .organic_results
            .into_iter()
            .filter(|hit| !hit.text().is_empty())
            .take(self.num as usize)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> SearchApiClient {
        let config = SearchConfig {
            api_key: Some(Secret::new("search-key")),
            api_url: format!("{}/api/v1/search", server.uri()),
        };
        SearchApiClient::from_config(&config, Duration::from_secs(5), 5)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_no_key_means_no_client() {
        let config = SearchConfig {
            api_key: None,
            api_url: "https://www.searchapi.io/api/v1/search".into(),
        };
        let client = SearchApiClient::from_config(&config, Duration::from_secs(5), 5).unwrap();
        assert!(client.is_none());
    }

    #[tokio::test]
    async fn test_search_reads_organic_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/search"))
            .and(query_param("engine", "google"))
            .and(query_param("q", "ai bookkeeping"))
            .and(query_param("api_key", "search-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "search_metadata": { "status": "Success" },
                "organic_results": [
                    { "position": 1, "title": "LedgerBot", "link": "https://ledgerbot.example", "snippet": "AI bookkeeping" },
                    { "position": 2, "title": "", "link": "https://empty.example" }
                ]
            })))
            .mount(&server)
            .await;

        let hits = client_for(&server).await.search("ai bookkeeping").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "LedgerBot");
        assert_eq!(hits[0].text(), "LedgerBot. AI bookkeeping");
    }

    #[tokio::test]
    async fn test_missing_results_key_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let hits = client_for(&server).await.search("anything").await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client_for(&server).await.search("anything").await.unwrap_err();
        assert_eq!(err.code(), "UPSTREAM_UNAVAILABLE");
    }
}
