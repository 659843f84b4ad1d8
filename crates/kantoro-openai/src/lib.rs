// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Azure OpenAI provider adapter for the Kantoro chat backend.
//!
//! This crate implements [`ChatProvider`] for the Azure OpenAI
//! chat-completions API, providing both single-shot completion and streaming
//! SSE responses. Model names in requests are Azure deployment names; the
//! orchestrator decides which deployment each turn uses.

pub mod client;
pub mod sse;
pub mod types;

use async_trait::async_trait;
use futures::stream::StreamExt;
use kantoro_config::model::OpenAiConfig;
use kantoro_core::traits::{ChatProvider, CompletionStream};
use kantoro_core::types::{Completion, CompletionDelta, CompletionRequest};
use kantoro_core::KantoroError;
use tracing::{debug, info};

use crate::client::AzureOpenAiClient;
use crate::types::{ChatCompletionChunk, ChatCompletionRequest, WireMessage};

/// Azure OpenAI provider implementing [`ChatProvider`].
///
/// API key resolution order: config -> `AZURE_OPENAI_API_KEY` env var -> error.
#[derive(Debug)]
pub struct OpenAiProvider {
    client: AzureOpenAiClient,
}

impl OpenAiProvider {
    /// Creates a new Azure OpenAI provider from the given configuration.
    ///
    /// # API Key Resolution
    /// 1. `openai.api_key` if set
    /// 2. `AZURE_OPENAI_API_KEY` environment variable
    /// 3. Returns error if neither is available
    pub fn new(config: &OpenAiConfig) -> Result<Self, KantoroError> {
        let endpoint = config.endpoint.clone().ok_or_else(|| {
            KantoroError::Config(
                "Azure OpenAI endpoint not configured. Set openai.endpoint in config.".into(),
            )
        })?;
        let api_key = resolve_api_key(&config.api_key)?;

        let client = AzureOpenAiClient::new(endpoint, api_key, config.api_version.clone())?;

        info!(
            api_version = config.api_version,
            primary_deployment = config.primary_deployment,
            "Azure OpenAI provider initialized"
        );

        Ok(Self { client })
    }

    /// Creates a provider with an existing client (for testing).
    #[cfg(test)]
    fn with_client(client: AzureOpenAiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, KantoroError> {
        let api_request = to_chat_completion_request(&request, false);
        let response = self.client.complete_chat(&request.model, &api_request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| KantoroError::Provider {
                message: "completion response contained no choices".into(),
                source: None,
            })?;
        debug!(
            finish_reason = choice.finish_reason.as_deref().unwrap_or("none"),
            "completion received"
        );

        Ok(Completion {
            message: choice.message.into_chat_message(),
            usage: response.usage,
        })
    }

    async fn stream(&self, request: CompletionRequest) -> Result<CompletionStream, KantoroError> {
        let api_request = to_chat_completion_request(&request, true);
        let chunk_stream = self.client.stream_chat(&request.model, &api_request).await?;

        let delta_stream = chunk_stream.filter_map(|result| async move {
            match result {
                Ok(chunk) => map_chunk_to_delta(chunk).map(Ok),
                Err(e) => Some(Err(e)),
            }
        });

        Ok(Box::pin(delta_stream))
    }
}

/// Converts the orchestrator's request into the wire request body.
///
/// An empty function catalog is dropped rather than serialized; Azure
/// rejects `functions: []`.
fn to_chat_completion_request(request: &CompletionRequest, stream: bool) -> ChatCompletionRequest {
    let functions = request
        .functions
        .clone()
        .and_then(|f| if f.is_empty() { None } else { Some(f) });

    ChatCompletionRequest {
        messages: request.messages.iter().map(WireMessage::from).collect(),
        temperature: request.temperature,
        functions,
        stream,
    }
}

/// Maps a streaming chunk to a [`CompletionDelta`].
///
/// Returns `None` for chunks with nothing to forward: the empty-choices
/// prompt-filter chunk and the final empty-delta chunk carrying only a
/// finish_reason.
fn map_chunk_to_delta(chunk: ChatCompletionChunk) -> Option<CompletionDelta> {
    let choice = chunk.choices.into_iter().next()?;
    if choice.delta.role.is_none() && choice.delta.content.is_none() {
        return None;
    }
    Some(CompletionDelta {
        role: choice.delta.role,
        content: choice.delta.content,
    })
}

/// Resolves the API key from config or environment.
fn resolve_api_key(config_key: &Option<String>) -> Result<String, KantoroError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("AZURE_OPENAI_API_KEY").map_err(|_| {
        KantoroError::Config(
            "Azure OpenAI API key not found. Set openai.api_key in config or AZURE_OPENAI_API_KEY environment variable.".into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use kantoro_core::types::{ChatMessage, FunctionDefinition, Role};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_provider(base_url: &str) -> OpenAiProvider {
        let client = AzureOpenAiClient::new(
            "https://unit-test.openai.azure.com".into(),
            "test-api-key".into(),
            "2023-07-01-preview".into(),
        )
        .unwrap()
        .with_base_url(base_url.to_string());
        OpenAiProvider::with_client(client)
    }

    fn catalog() -> Vec<FunctionDefinition> {
        vec![FunctionDefinition {
            name: "Joan-getAvailableDesks".into(),
            description: "List desks free in a window".into(),
            parameters: serde_json::json!({"type": "object", "properties": {}}),
        }]
    }

    #[test]
    fn resolve_api_key_from_config() {
        let result = resolve_api_key(&Some("azure-test-key".into()));
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "azure-test-key");
    }

    #[test]
    fn resolve_api_key_empty_config_falls_back_to_env() {
        let result = resolve_api_key(&Some("".into()));
        // Will fail unless AZURE_OPENAI_API_KEY is set, which is fine for tests.
        // We just verify it doesn't return the empty string.
        if result.is_ok() {
            assert!(!result.unwrap().is_empty());
        }
    }

    #[test]
    fn resolve_api_key_none_falls_back_to_env() {
        let result = resolve_api_key(&None);
        // Will succeed if env is set, fail otherwise.
        if result.is_err() {
            let err = result.unwrap_err().to_string();
            assert!(err.contains("API key not found"), "got: {err}");
        }
    }

    #[test]
    fn provider_requires_endpoint() {
        let config = OpenAiConfig {
            endpoint: None,
            api_key: Some("key".into()),
            ..OpenAiConfig::default()
        };
        let result = OpenAiProvider::new(&config);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("endpoint"), "got: {err}");
    }

    #[test]
    fn to_request_maps_messages_and_functions() {
        let request = CompletionRequest {
            model: "gpt-4-32k".into(),
            messages: vec![
                ChatMessage::system("You are helpful."),
                ChatMessage::user("Any desks free tomorrow?"),
            ],
            temperature: 0.1,
            functions: Some(catalog()),
        };

        let api_req = to_chat_completion_request(&request, false);
        assert_eq!(api_req.messages.len(), 2);
        assert_eq!(api_req.messages[0].role, Role::System);
        assert_eq!(api_req.messages[1].content.as_deref(), Some("Any desks free tomorrow?"));
        assert_eq!(api_req.temperature, 0.1);
        assert!(!api_req.stream);
        assert_eq!(api_req.functions.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn to_request_drops_empty_function_catalog() {
        let request = CompletionRequest {
            model: "gpt-4-32k".into(),
            messages: vec![ChatMessage::user("hi")],
            temperature: 0.0,
            functions: Some(vec![]),
        };
        let api_req = to_chat_completion_request(&request, true);
        assert!(api_req.functions.is_none());
        assert!(api_req.stream);
    }

    #[test]
    fn to_request_omits_functions_when_none() {
        let request = CompletionRequest {
            model: "gpt-4".into(),
            messages: vec![ChatMessage::user("hi")],
            temperature: 0.7,
            functions: None,
        };
        let api_req = to_chat_completion_request(&request, false);
        assert!(api_req.functions.is_none());
    }

    #[test]
    fn map_chunk_role_only() {
        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"choices":[{"index":0,"delta":{"role":"assistant"},"finish_reason":null}]}"#,
        )
        .unwrap();
        let delta = map_chunk_to_delta(chunk).unwrap();
        assert_eq!(delta.role, Some(Role::Assistant));
        assert!(delta.content.is_none());
    }

    #[test]
    fn map_chunk_content() {
        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"choices":[{"index":0,"delta":{"content":"Hi"},"finish_reason":null}]}"#,
        )
        .unwrap();
        let delta = map_chunk_to_delta(chunk).unwrap();
        assert_eq!(delta.content.as_deref(), Some("Hi"));
    }

    #[test]
    fn map_chunk_empty_choices_skipped() {
        let chunk: ChatCompletionChunk = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(map_chunk_to_delta(chunk).is_none());
    }

    #[test]
    fn map_chunk_finish_marker_skipped() {
        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#,
        )
        .unwrap();
        assert!(map_chunk_to_delta(chunk).is_none());
    }

    #[tokio::test]
    async fn complete_returns_function_call_message() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "id": "chatcmpl-fc",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "gpt-4-32k",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "function_call": {
                        "name": "Joan-getAvailableDesks",
                        "arguments": "{\"from\":\"2026-03-02T09:00:00Z\",\"to\":\"2026-03-02T17:00:00Z\"}"
                    }
                },
                "finish_reason": "function_call"
            }],
            "usage": {"prompt_tokens": 200, "completion_tokens": 40, "total_tokens": 240}
        });

        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4-32k/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let provider = test_provider(&server.uri());
        let completion = provider
            .complete(CompletionRequest {
                model: "gpt-4-32k".into(),
                messages: vec![ChatMessage::user("Any desks free tomorrow?")],
                temperature: 0.1,
                functions: Some(catalog()),
            })
            .await
            .unwrap();

        assert_eq!(completion.message.role, Role::Assistant);
        assert_eq!(completion.message.content, "");
        let fc = completion.message.function_call.unwrap();
        assert_eq!(fc.name, "Joan-getAvailableDesks");
        assert!(fc.arguments.contains("2026-03-02"));
        assert_eq!(completion.usage.unwrap().total_tokens, 240);
    }

    #[tokio::test]
    async fn stream_yields_role_then_content_deltas() {
        let server = MockServer::start().await;

        let sse = concat!(
            "data: {\"id\":\"c1\",\"choices\":[],\"prompt_filter_results\":[{\"prompt_index\":0}]}\n\n",
            "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\"},\"finish_reason\":null}]}\n\n",
            "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Sure\"},\"finish_reason\":null}]}\n\n",
            "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"!\"},\"finish_reason\":null}]}\n\n",
            "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
            "data: [DONE]\n\n",
        );

        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse),
            )
            .mount(&server)
            .await;

        let provider = test_provider(&server.uri());
        let mut stream = provider
            .stream(CompletionRequest {
                model: "gpt-4".into(),
                messages: vec![ChatMessage::user("hi")],
                temperature: 0.0,
                functions: None,
            })
            .await
            .unwrap();

        let mut deltas = Vec::new();
        while let Some(delta) = stream.next().await {
            deltas.push(delta.unwrap());
        }

        // Filter chunks and the finish marker are dropped; role arrives first.
        assert_eq!(deltas.len(), 3);
        assert_eq!(deltas[0].role, Some(Role::Assistant));
        assert_eq!(deltas[1].content.as_deref(), Some("Sure"));
        assert_eq!(deltas[2].content.as_deref(), Some("!"));
    }
}
