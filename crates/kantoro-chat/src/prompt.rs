// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System-prompt loading and the injected policy message.
//!
//! Loads the conversation policy from config and renders the per-thread
//! system message that anchors every conversation: the current timestamp,
//! the caller's identity, and the policy text.

use kantoro_config::model::AgentConfig;
use kantoro_core::ChatMessage;
use tracing::info;

/// Conversation policy used when config supplies no override.
pub const DEFAULT_POLICY: &str = "\
You are a AI assistant who helps with ONLY topics that you can find in Plugins/Functions.

If you are not sure about question ask for clarification or say you do not know the answer.

if you don't find answer within context, say it do not know the answer.
If user asks for help other than what function callings are for, then you cannot help them, and say what you can help with.

You can personalize response, use users name or emojis and make it little less professional response and make it fun.
But remember you are still in professional environment, so don't get too personal.
Keep answer as short as possible, very short please. few statements or even single if you can do it.
If user just says Hi or how are you to start conversation, you can respond with greetings and what you can do for them.";

/// Loads the conversation policy following config priority: file > inline > default.
///
/// # Priority
/// 1. `config.system_prompt_path` -- reads from disk
/// 2. `config.system_prompt` -- inline string
/// 3. [`DEFAULT_POLICY`]
pub async fn load_policy(config: &AgentConfig) -> String {
    // Priority 1: file path
    if let Some(ref file_path) = config.system_prompt_path {
        match tokio::fs::read_to_string(file_path).await {
            Ok(content) => {
                let trimmed = content.trim().to_string();
                if !trimmed.is_empty() {
                    info!(path = file_path.as_str(), "loaded system prompt from file");
                    return trimmed;
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = file_path.as_str(),
                    error = %e,
                    "failed to read system prompt file, falling back"
                );
            }
        }
    }

    // Priority 2: inline string
    if let Some(ref prompt) = config.system_prompt
        && !prompt.is_empty()
    {
        return prompt.clone();
    }

    // Priority 3: default
    DEFAULT_POLICY.to_string()
}

/// Renders the system message injected at the head of every conversation.
///
/// The header carries the current timestamp and the caller's identity so the
/// model can resolve relative dates and personalize answers. The blank line
/// after the header keeps one space, matching the persisted shape clients
/// already parse.
pub fn system_message(policy: &str, sender_name: &str, sender_email: &str) -> ChatMessage {
    let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
    ChatMessage::system(format!(
        "Current Date and Time is {now}.\nUser's name is {sender_name} and user's emailID is {sender_email}.\n \n{policy}"
    ))
}
