// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expiring per-user message buffer for buffered (non-durable) conversations.
//!
//! Buffered conversations trade persistence for zero storage dependencies:
//! history lives in process memory, scoped to the user's email, and is
//! dropped on expiry or when the user-message cap is hit. The model can
//! also reset it explicitly through the built-in `clearChatHistory`
//! function.

pub mod buffer;

pub use buffer::{BufferMemory, BUFFER_TTL, MAX_BUFFERED_USER_MESSAGES};

use kantoro_core::types::FunctionDefinition;

/// Name of the built-in history-reset function exposed in buffered chats.
pub const CLEAR_CHAT_HISTORY: &str = "clearChatHistory";

/// Definition of the built-in history-reset function.
///
/// Unlike plugin functions this name carries no scope separator; the
/// buffered engine intercepts it before registry dispatch.
pub fn clear_chat_history_definition() -> FunctionDefinition {
    FunctionDefinition {
        name: CLEAR_CHAT_HISTORY.to_string(),
        description: "Clear the chat history for a given user based on their email address. \
                      Clears chat history, Starts new session. Clear sessions. Starts new topic"
            .to_string(),
        parameters: serde_json::json!({ "type": "object", "properties": {} }),
    }
}
