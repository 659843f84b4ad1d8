// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Azure Cognitive Search document API.
//!
//! Implements the [`SearchIndex`] trait over the REST search endpoint:
//! `POST {endpoint}/indexes/{index}/docs/search?api-version={v}` with an
//! `api-key` header. Only the `title` and `content` fields are selected;
//! that is all the document plugins consume.

use std::time::Duration;

use async_trait::async_trait;
use kantoro_config::model::SearchConfig;
use kantoro_core::{KantoroError, SearchHit, SearchIndex};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    search: &'a str,
    top: usize,
    select: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<SearchDocument>,
}

#[derive(Debug, Deserialize)]
struct SearchDocument {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

/// Ranked-retrieval client over the Azure Cognitive Search REST API.
#[derive(Debug, Clone)]
pub struct SearchIndexClient {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
}

impl SearchIndexClient {
    /// Creates a search client from the `[search]` config section.
    ///
    /// Requires `search.endpoint`; the API key falls back to the
    /// `AZURE_SEARCH_ADMIN_KEY` environment variable when unset.
    pub fn new(config: &SearchConfig) -> Result<Self, KantoroError> {
        let endpoint = config.endpoint.as_deref().ok_or_else(|| {
            KantoroError::Config(
                "search.endpoint is required for the document-search plugins".to_string(),
            )
        })?;
        let api_key = resolve_api_key(&config.api_key)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "api-key",
            HeaderValue::from_str(&api_key).map_err(|e| {
                KantoroError::Config(format!("invalid search API key header value: {e}"))
            })?,
        );
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| KantoroError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
        })
    }
}

#[async_trait]
impl SearchIndex for SearchIndexClient {
    async fn search(
        &self,
        index: &str,
        query: &str,
        top: usize,
    ) -> Result<Vec<SearchHit>, KantoroError> {
        let url = format!(
            "{}/indexes/{}/docs/search?api-version={}",
            self.base_url, index, self.api_version
        );
        debug!(index, top, "searching index");

        let response = self
            .client
            .post(&url)
            .json(&SearchRequest {
                search: query,
                top,
                select: "title,content",
            })
            .send()
            .await
            .map_err(|e| KantoroError::Provider {
                message: format!("search request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| KantoroError::Provider {
            message: format!("failed to read search response: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            return Err(KantoroError::Provider {
                message: format!("search API returned {status}: {body}"),
                source: None,
            });
        }

        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| KantoroError::Provider {
                message: format!("failed to parse search response: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(parsed
            .value
            .into_iter()
            .map(|doc| SearchHit {
                title: doc.title,
                content: doc.content,
            })
            .collect())
    }
}

fn resolve_api_key(configured: &Option<String>) -> Result<String, KantoroError> {
    if let Some(key) = configured
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    if let Ok(key) = std::env::var("AZURE_SEARCH_ADMIN_KEY")
        && !key.is_empty()
    {
        return Ok(key);
    }

    Err(KantoroError::Config(
        "Azure Search API key not found. Set search.api_key in config or AZURE_SEARCH_ADMIN_KEY environment variable.".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> SearchIndexClient {
        let config = SearchConfig {
            endpoint: Some(base_url.to_string()),
            api_key: Some("test-search-key".to_string()),
            ..SearchConfig::default()
        };
        SearchIndexClient::new(&config).unwrap()
    }

    #[test]
    fn new_requires_endpoint() {
        let result = SearchIndexClient::new(&SearchConfig {
            api_key: Some("key".to_string()),
            ..SearchConfig::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn resolve_api_key_prefers_config_value() {
        let result = resolve_api_key(&Some("from-config".to_string()));
        assert_eq!(result.unwrap(), "from-config");
    }

    #[test]
    fn resolve_api_key_ignores_empty_config_value() {
        // Falls through to the env var; errors when that is unset too.
        let result = resolve_api_key(&Some(String::new()));
        if let Ok(key) = std::env::var("AZURE_SEARCH_ADMIN_KEY") {
            if !key.is_empty() {
                assert_eq!(result.unwrap(), key);
            }
        } else {
            assert!(result.is_err());
        }
    }

    #[tokio::test]
    async fn search_posts_query_and_maps_hits() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/indexes/employee-cvs/docs/search"))
            .and(query_param("api-version", "2023-07-01-Preview"))
            .and(header("api-key", "test-search-key"))
            .and(body_partial_json(serde_json::json!({
                "search": "rust experience",
                "top": 4,
                "select": "title,content"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [
                    {"title": "cv-a.pdf", "content": "Alice, systems engineer"},
                    {"title": "cv-b.pdf", "content": "Bob, backend developer"}
                ]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let hits = client.search("employee-cvs", "rust experience", 4).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "cv-a.pdf");
        assert_eq!(hits[1].content, "Bob, backend developer");
    }

    #[tokio::test]
    async fn search_tolerates_missing_fields() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/indexes/handbook/docs/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{"title": "intro"}]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let hits = client.search("handbook", "intro", 4).await.unwrap();
        assert_eq!(hits[0].title, "intro");
        assert_eq!(hits[0].content, "");
    }

    #[tokio::test]
    async fn search_empty_value_yields_no_hits() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/indexes/handbook/docs/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": []})))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let hits = client.search("handbook", "nothing", 4).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn search_error_status_is_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/indexes/handbook/docs/search"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": {"code": "Forbidden", "message": "Invalid api key"}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.search("handbook", "query", 4).await.unwrap_err();
        assert!(err.to_string().contains("403"), "got: {err}");
    }
}
