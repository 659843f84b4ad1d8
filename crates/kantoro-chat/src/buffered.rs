// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Buffer-backed chat cycle for single-process deployments.
//!
//! Runs the same single-hop function-calling cycle as
//! [`ChatEngine`](crate::engine::ChatEngine), but against the expiring
//! in-memory buffer keyed by the caller's email instead of the durable
//! store. Serves integrations that keep no thread state of their own.
//! The buffered catalog additionally exposes the built-in
//! `clearChatHistory` function so the user can reset the session in
//! conversation.

use std::sync::Arc;

use tracing::{debug, info};

use kantoro_core::{ChatMessage, ChatProvider, CompletionRequest, KantoroError};
use kantoro_memory::{clear_chat_history_definition, BufferMemory, CLEAR_CHAT_HISTORY};
use kantoro_plugin::PluginRegistry;

use crate::engine::{resolve_function_call, INITIAL_TEMPERATURE};
use crate::prompt;

/// Confirmation returned when the user asks to clear their session.
pub const HISTORY_CLEARED_REPLY: &str = "Chat History has been deleted. New Session will start with your next message. All Previous chat history will be ignored.";

/// Runs the single-hop chat cycle against the short-term buffer.
pub struct BufferedChatEngine {
    provider: Arc<dyn ChatProvider>,
    registry: Arc<PluginRegistry>,
    buffer: Arc<BufferMemory>,
    model: String,
    policy: String,
}

impl BufferedChatEngine {
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        registry: Arc<PluginRegistry>,
        buffer: Arc<BufferMemory>,
        model: impl Into<String>,
        policy: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            registry,
            buffer,
            model: model.into(),
            policy: policy.into(),
        }
    }

    /// Answer `user_message` against the caller's buffered session,
    /// returning the final answer text.
    ///
    /// A fresh session starts with the policy system message pushed into
    /// the buffer itself; every new message of the cycle is appended to the
    /// buffer once the cycle completes. Only messages newer than the
    /// pre-cycle snapshot are appended, so the entry is never
    /// double-extended.
    pub async fn respond(
        &self,
        sender_name: &str,
        sender_email: &str,
        user_message: &str,
        plugin_scope: Option<&str>,
    ) -> Result<String, KantoroError> {
        let mut messages = self.buffer.messages(sender_email).await;
        let snapshot_len = messages.len();

        if messages.is_empty() {
            messages.push(prompt::system_message(&self.policy, sender_name, sender_email));
        }
        messages.push(ChatMessage::user(user_message));
        debug!(
            user = sender_email,
            messages = messages.len(),
            "assembled buffered session"
        );

        let mut catalog = self.registry.scoped_catalog(plugin_scope);
        catalog.push(clear_chat_history_definition());

        let completion = self
            .provider
            .complete(CompletionRequest {
                model: self.model.clone(),
                messages: messages.clone(),
                temperature: INITIAL_TEMPERATURE,
                functions: Some(catalog),
            })
            .await?;
        let initial = completion.message;

        let Some(call) = initial.function_call.clone().filter(|c| !c.name.is_empty()) else {
            let reply = initial.content.clone();
            messages.push(initial);
            self.store_new_messages(sender_email, &messages, snapshot_len).await;
            return Ok(reply);
        };

        // The history-reset builtin never reaches the registry: the entry
        // is dropped and the confirmation goes out without a follow-up.
        if call.name == CLEAR_CHAT_HISTORY {
            info!(user = sender_email, "clearing buffered session on request");
            self.buffer.clear(sender_email).await;
            return Ok(HISTORY_CLEARED_REPLY.to_string());
        }

        info!(function = %call.name, "executing requested function");
        let (result, follow_up) =
            resolve_function_call(&self.registry, &call, sender_email).await?;

        messages.push(initial);
        messages.push(ChatMessage::function(
            &call.name,
            format!("{result}{}", follow_up.prompt),
        ));

        let completion = self
            .provider
            .complete(CompletionRequest {
                model: follow_up.model.clone().unwrap_or_else(|| self.model.clone()),
                messages: messages.clone(),
                temperature: follow_up.temperature.unwrap_or(0.0),
                functions: None,
            })
            .await?;
        let reply = completion.message.content.clone();
        messages.push(completion.message);

        if follow_up.clear_buffer {
            self.buffer.clear(sender_email).await;
        } else {
            self.store_new_messages(sender_email, &messages, snapshot_len).await;
        }
        Ok(reply)
    }

    /// Append everything newer than the pre-cycle snapshot, then apply the
    /// session cap.
    async fn store_new_messages(
        &self,
        sender_email: &str,
        messages: &[ChatMessage],
        snapshot_len: usize,
    ) {
        self.buffer
            .add_messages(sender_email, &messages[snapshot_len..])
            .await;
        if self.buffer.clear_if_full(sender_email).await {
            debug!(user = sender_email, "buffered session reached the cap, cleared");
        }
    }
}
