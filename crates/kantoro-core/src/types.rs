// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Kantoro workspace.
//!
//! [`ChatMessage`] doubles as the persisted message payload and the
//! provider-facing message, so its serde shape is the storage shape:
//! camelCase keys, `functionCall.arguments` kept as the raw JSON string the
//! model produced. Provider crates convert to their own wire types.

use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};

/// Message role. Exactly these four values ever appear in a thread.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Function,
}

/// The model's decision to invoke a named function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Qualified function name (`<plugin>-<method>`).
    pub name: String,
    /// JSON-encoded argument object, exactly as produced by the model.
    pub arguments: String,
}

/// One conversation turn, in the persisted data shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: Role,
    /// May be empty when a function call is present. Providers send `null`
    /// in that case; it deserializes to the empty string.
    #[serde(default, deserialize_with = "null_to_empty")]
    pub content: String,
    /// Set only on `function`-role messages: the function whose result this carries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

fn null_to_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            name: None,
            function_call: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            name: None,
            function_call: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            name: None,
            function_call: None,
        }
    }

    /// A `function`-role message carrying a named function's result.
    pub fn function(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Function,
            content: content.into(),
            name: Some(name.into()),
            function_call: None,
        }
    }
}

/// The wire-facing part of a callable function: what the model sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Qualified name (`<plugin>-<method>`), globally unique.
    pub name: String,
    pub description: String,
    /// JSON-schema-like parameter object.
    pub parameters: serde_json::Value,
}

/// Policy applied after a function executes: how the follow-up completion
/// phrases the final answer.
#[derive(Debug, Clone, Default)]
pub struct FollowUp {
    /// Appended verbatim after the function result in the function-role message.
    pub prompt: String,
    /// Follow-up sampling temperature; absent means 0.
    pub temperature: Option<f32>,
    /// Follow-up model deployment; absent means the primary deployment.
    pub model: Option<String>,
    /// Delete the caller's buffer entry once the cycle finalizes.
    pub clear_buffer: bool,
}

/// A registry entry: the model-visible definition plus follow-up policy.
#[derive(Debug, Clone)]
pub struct FunctionSpec {
    pub definition: FunctionDefinition,
    pub follow_up: FollowUp,
}

impl FunctionSpec {
    /// Qualified name shorthand.
    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

/// A chat-completion request as the orchestrator issues it.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Model deployment name.
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    /// Function catalog; `None` on follow-up turns, where calls are not permitted.
    pub functions: Option<Vec<FunctionDefinition>>,
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A completed (non-streaming) provider response.
#[derive(Debug, Clone)]
pub struct Completion {
    pub message: ChatMessage,
    pub usage: Option<TokenUsage>,
}

/// One increment of a streamed completion. The role arrives at most once,
/// in the first delta.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionDelta {
    pub role: Option<Role>,
    pub content: Option<String>,
}

/// Out-of-band metadata tags interleaved into the output stream as
/// `[[<tag>=<value>]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataTag {
    ThreadId,
    UserMessageId,
    UserMessageCreatedAt,
    Role,
    AiMessageId,
    AiMessageCreatedAt,
}

impl MetadataTag {
    /// The literal tag name as it appears on the stream.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataTag::ThreadId => "threadId",
            MetadataTag::UserMessageId => "userMessageId",
            MetadataTag::UserMessageCreatedAt => "userMessageCreatedAt",
            MetadataTag::Role => "role",
            MetadataTag::AiMessageId => "aiMessageId",
            MetadataTag::AiMessageCreatedAt => "aiMessageCreatedAt",
        }
    }

    /// Render the tag with its value in stream syntax.
    pub fn render(&self, value: &str) -> String {
        format!("[[{}={}]]", self.as_str(), value)
    }
}

impl std::fmt::Display for MetadataTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ranked result from a search index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub content: String,
}
