// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat provider for deterministic testing.
//!
//! `MockProvider` implements `ChatProvider` with scripted assistant
//! messages, enabling fast, CI-runnable tests without external API calls.
//! Every request is captured so tests can assert on the model,
//! temperature, and function catalog the orchestrator sent.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;
use tokio::sync::Mutex;

use kantoro_core::{
    ChatMessage, ChatProvider, Completion, CompletionDelta, CompletionRequest,
    CompletionStream, KantoroError, TokenUsage,
};

/// A mock chat provider that returns scripted assistant messages.
///
/// Messages are popped from a FIFO queue. When the queue is empty,
/// a default "mock response" assistant message is returned. Scripted
/// errors surface as [`KantoroError::Provider`].
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<Result<ChatMessage, String>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider with an empty response queue.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock provider pre-loaded with the given assistant messages.
    pub fn with_messages(messages: Vec<ChatMessage>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(messages.into_iter().map(Ok).collect())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a message to the end of the queue.
    pub async fn push(&self, message: ChatMessage) {
        self.responses.lock().await.push_back(Ok(message));
    }

    /// Add a provider failure to the end of the queue.
    pub async fn push_error(&self, message: impl Into<String>) {
        self.responses.lock().await.push_back(Err(message.into()));
    }

    /// Return a copy of every request this provider has received, in order.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    /// Pop the next scripted message, or return the default.
    async fn next_message(&self) -> Result<ChatMessage, String> {
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(ChatMessage::assistant("mock response")))
    }

    async fn record(&self, request: &CompletionRequest) {
        self.requests.lock().await.push(request.clone());
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, KantoroError> {
        self.record(&request).await;
        match self.next_message().await {
            Ok(message) => Ok(Completion {
                message,
                usage: Some(TokenUsage {
                    prompt_tokens: 10,
                    completion_tokens: 20,
                    total_tokens: 30,
                }),
            }),
            Err(message) => Err(KantoroError::Provider {
                message,
                source: None,
            }),
        }
    }

    async fn stream(&self, request: CompletionRequest) -> Result<CompletionStream, KantoroError> {
        self.record(&request).await;
        let message = match self.next_message().await {
            Ok(message) => message,
            Err(message) => {
                return Err(KantoroError::Provider {
                    message,
                    source: None,
                });
            }
        };

        // A role-only delta first, then the content split into fragments,
        // mirroring how real chat-completion streams arrive.
        let mut deltas = vec![Ok(CompletionDelta {
            role: Some(message.role),
            content: None,
        })];
        for fragment in message.content.split_inclusive(' ') {
            deltas.push(Ok(CompletionDelta {
                role: None,
                content: Some(fragment.to_string()),
            }));
        }

        Ok(Box::pin(stream::iter(deltas)))
    }
}
