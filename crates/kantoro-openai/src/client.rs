// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Azure OpenAI chat-completions API.
//!
//! Provides [`AzureOpenAiClient`] which handles per-deployment URL
//! construction, authentication, streaming SSE responses, and transient
//! error retry.

use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use kantoro_core::KantoroError;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::sse;
use crate::types::{ApiErrorResponse, ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse};

/// HTTP client for Azure OpenAI communication.
///
/// One client serves every deployment on the resource; the deployment name
/// is a path segment chosen per request. Manages the `api-key` header,
/// connection pooling, and retry logic for transient errors.
#[derive(Debug, Clone)]
pub struct AzureOpenAiClient {
    client: reqwest::Client,
    api_version: String,
    max_retries: u32,
    base_url: String,
}

impl AzureOpenAiClient {
    /// Creates a new Azure OpenAI client.
    ///
    /// # Arguments
    /// * `endpoint` - Resource endpoint, e.g. `https://myresource.openai.azure.com`
    /// * `api_key` - Azure OpenAI API key for authentication
    /// * `api_version` - REST API version string (e.g., "2023-07-01-preview")
    pub fn new(endpoint: String, api_key: String, api_version: String) -> Result<Self, KantoroError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "api-key",
            HeaderValue::from_str(&api_key).map_err(|e| {
                KantoroError::Config(format!("invalid API key header value: {e}"))
            })?,
        );
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| KantoroError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            api_version,
            max_retries: 1,
            base_url: endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn completions_url(&self, deployment: &str) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.base_url, deployment, self.api_version
        )
    }

    /// Sends a non-streaming request against the given deployment.
    ///
    /// On transient errors (429, 500, 502, 503), retries once after a
    /// 1-second delay.
    pub async fn complete_chat(
        &self,
        deployment: &str,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, KantoroError> {
        let mut req = request.clone();
        req.stream = false;
        let url = self.completions_url(deployment);

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, deployment, "retrying completion request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&url)
                .json(&req)
                .send()
                .await
                .map_err(|e| KantoroError::Provider {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, deployment, "completion response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| KantoroError::Provider {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                let completion: ChatCompletionResponse =
                    serde_json::from_str(&body).map_err(|e| KantoroError::Provider {
                        message: format!("failed to parse API response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                return Ok(completion);
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(KantoroError::Provider {
                    message: format!("API returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            // Non-transient error or exhausted retries.
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        Err(last_error.unwrap_or_else(|| KantoroError::Provider {
            message: "completion request failed after retries".into(),
            source: None,
        }))
    }

    /// Sends a streaming request against the given deployment and returns a
    /// stream of completion chunks.
    ///
    /// On transient errors (429, 500, 502, 503), retries once after a
    /// 1-second delay.
    pub async fn stream_chat(
        &self,
        deployment: &str,
        request: &ChatCompletionRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk, KantoroError>> + Send>>, KantoroError>
    {
        let mut req = request.clone();
        req.stream = true;
        let url = self.completions_url(deployment);

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, deployment, "retrying streaming request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&url)
                .json(&req)
                .send()
                .await
                .map_err(|e| KantoroError::Provider {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, deployment, "streaming response received");

            if status.is_success() {
                return Ok(sse::parse_chunk_stream(response));
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(KantoroError::Provider {
                    message: format!("API returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            // Non-transient error or exhausted retries.
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        Err(last_error.unwrap_or_else(|| KantoroError::Provider {
            message: "streaming request failed after retries".into(),
            source: None,
        }))
    }
}

/// Builds the terminal provider error from a failed response body, keeping
/// the structured code and message when the body parses as an API error.
fn api_error(status: reqwest::StatusCode, body: &str) -> KantoroError {
    let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(body) {
        format!(
            "Azure OpenAI API error ({}): {}",
            api_err.error.code_str(),
            api_err.error.message
        )
    } else {
        format!("API returned {status}: {body}")
    };
    KantoroError::Provider {
        message,
        source: None,
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use kantoro_core::Role;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> AzureOpenAiClient {
        AzureOpenAiClient::new(
            "https://unit-test.openai.azure.com".into(),
            "test-api-key".into(),
            "2023-07-01-preview".into(),
        )
        .unwrap()
        .with_base_url(base_url.to_string())
    }

    fn test_request() -> ChatCompletionRequest {
        ChatCompletionRequest {
            messages: vec![crate::types::WireMessage {
                role: Role::User,
                content: Some("Hello".into()),
                name: None,
                function_call: None,
            }],
            temperature: 0.1,
            functions: None,
            stream: false,
        }
    }

    fn success_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "gpt-4-32k",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        })
    }

    #[tokio::test]
    async fn complete_chat_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4-32k/chat/completions"))
            .and(query_param("api-version", "2023-07-01-preview"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("Hi there!")))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.complete_chat("gpt-4-32k", &test_request()).await.unwrap();

        assert_eq!(result.id, "chatcmpl-test");
        assert_eq!(result.choices[0].message.content.as_deref(), Some("Hi there!"));
        assert_eq!(result.usage.unwrap().prompt_tokens, 10);
    }

    #[tokio::test]
    async fn complete_chat_routes_by_deployment() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-35-turbo-16k/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("routed")))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client
            .complete_chat("gpt-35-turbo-16k", &test_request())
            .await
            .unwrap();
        assert_eq!(result.choices[0].message.content.as_deref(), Some("routed"));
    }

    #[tokio::test]
    async fn complete_chat_retries_on_429() {
        let server = MockServer::start().await;

        let error_body = serde_json::json!({
            "error": {"code": "429", "message": "Rate limited"}
        });

        // First request returns 429, second returns 200.
        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4-32k/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(&error_body))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4-32k/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("After retry")))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.complete_chat("gpt-4-32k", &test_request()).await.unwrap();
        assert_eq!(result.choices[0].message.content.as_deref(), Some("After retry"));
    }

    #[tokio::test]
    async fn complete_chat_fails_on_400() {
        let server = MockServer::start().await;

        let error_body = serde_json::json!({
            "error": {"code": "invalid_request", "message": "functions must not be empty"}
        });

        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4-32k/chat/completions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(&error_body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.complete_chat("gpt-4-32k", &test_request()).await;
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("invalid_request"), "got: {err}");
    }

    #[tokio::test]
    async fn complete_chat_exhausts_retries_on_503() {
        let server = MockServer::start().await;

        let error_body = serde_json::json!({
            "error": {"code": "503", "message": "Service unavailable"}
        });

        // Both attempts return 503.
        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4-32k/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_json(&error_body))
            .expect(2)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.complete_chat("gpt-4-32k", &test_request()).await;
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Service unavailable"), "got: {err}");
    }

    #[tokio::test]
    async fn client_sends_api_key_header() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4-32k/chat/completions"))
            .and(header("api-key", "test-api-key"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("ok")))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.complete_chat("gpt-4-32k", &test_request()).await;
        assert!(result.is_ok(), "headers should match: {result:?}");
    }

    #[tokio::test]
    async fn stream_chat_yields_chunks_until_done() {
        let server = MockServer::start().await;

        let sse = concat!(
            "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\"},\"finish_reason\":null}]}\n\n",
            "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hel\"},\"finish_reason\":null}]}\n\n",
            "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"lo\"},\"finish_reason\":null}]}\n\n",
            "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
            "data: [DONE]\n\n",
        );

        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4-32k/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let mut stream = client.stream_chat("gpt-4-32k", &test_request()).await.unwrap();

        let mut content = String::new();
        let mut saw_role = false;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.unwrap();
            if let Some(choice) = chunk.choices.first() {
                if choice.delta.role.is_some() {
                    saw_role = true;
                }
                if let Some(ref text) = choice.delta.content {
                    content.push_str(text);
                }
            }
        }
        assert!(saw_role);
        assert_eq!(content, "Hello");
    }

    #[tokio::test]
    async fn stream_chat_fails_on_401_without_retry() {
        let server = MockServer::start().await;

        let error_body = serde_json::json!({
            "error": {"code": "401", "message": "Access denied due to invalid subscription key"}
        });

        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4-32k/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(&error_body))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.stream_chat("gpt-4-32k", &test_request()).await;
        assert!(result.is_err());
        let err = result.err().unwrap().to_string();
        assert!(err.contains("Access denied"), "got: {err}");
    }
}
