// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Azure OpenAI chat-completions request/response wire types.
//!
//! The wire shape is snake_case (`function_call`), unlike the persisted
//! camelCase shape in [`kantoro_core::types`]. Conversions live here so the
//! rest of the workspace never sees the wire spelling.

use kantoro_core::types::{ChatMessage, FunctionCall, FunctionDefinition, Role, TokenUsage};
use serde::{Deserialize, Serialize};

// --- Request types ---

/// A request body for the chat-completions endpoint.
///
/// The deployment is not part of the body; Azure routes by the deployment
/// segment in the URL.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    /// Conversation messages, oldest first.
    pub messages: Vec<WireMessage>,

    /// Sampling temperature.
    pub temperature: f32,

    /// Function catalog offered to the model. Azure rejects an empty array,
    /// so this is omitted entirely when no functions apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<FunctionDefinition>>,

    /// Whether to stream the response as SSE chunks.
    pub stream: bool,
}

/// A single message in the chat-completions wire format.
///
/// Used on both sides: serialized in requests, deserialized from response
/// choices. `content` is nullable -- the model sends `null` alongside a
/// `function_call`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,

    pub content: Option<String>,

    /// Function name, required on `function`-role messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<WireFunctionCall>,
}

/// A function invocation in wire spelling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireFunctionCall {
    pub name: String,
    /// JSON-encoded argument object, passed through verbatim.
    pub arguments: String,
}

impl From<&ChatMessage> for WireMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role,
            content: Some(msg.content.clone()),
            name: msg.name.clone(),
            function_call: msg.function_call.as_ref().map(|fc| WireFunctionCall {
                name: fc.name.clone(),
                arguments: fc.arguments.clone(),
            }),
        }
    }
}

impl WireMessage {
    /// Converts into the persisted message shape. Null content becomes the
    /// empty string.
    pub fn into_chat_message(self) -> ChatMessage {
        ChatMessage {
            role: self.role,
            content: self.content.unwrap_or_default(),
            name: self.name,
            function_call: self.function_call.map(|fc| FunctionCall {
                name: fc.name,
                arguments: fc.arguments,
            }),
        }
    }
}

// --- Response types ---

/// A full (non-streaming) chat-completions response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    /// Response ID.
    pub id: String,
    /// Model that generated the response.
    #[serde(default)]
    pub model: Option<String>,
    /// Completion choices. Exactly one unless `n` was requested.
    pub choices: Vec<CompletionChoice>,
    /// Token accounting. Matches the core shape field for field.
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

/// One completion choice in a full response.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionChoice {
    pub index: u32,
    pub message: WireMessage,
    /// `stop`, `function_call`, `length` or `content_filter`.
    pub finish_reason: Option<String>,
}

// --- Streaming chunk types ---

/// One SSE chunk of a streaming response.
///
/// Azure emits an initial chunk with an empty `choices` array carrying
/// prompt-filter results; callers must tolerate it.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

/// One choice within a streaming chunk.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    pub delta: ChunkDelta,
    pub finish_reason: Option<String>,
}

/// The incremental payload of a chunk. The role arrives once, in the first
/// content-bearing chunk; later chunks carry content fragments only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub content: Option<String>,
}

// --- Error types ---

/// API error response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// Error details.
    pub error: ApiErrorDetail,
}

/// Error detail within an API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    /// Machine-readable error code, e.g. `429` or `content_filter`.
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable error message.
    pub message: String,
}

impl ApiErrorDetail {
    /// Code for display, `unknown` when the service omitted it.
    pub fn code_str(&self) -> &str {
        self.code.as_deref().unwrap_or("unknown")
    }
}
