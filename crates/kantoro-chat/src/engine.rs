// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The chat orchestration cycle.
//!
//! One cycle answers one user message against a durable thread: load the
//! history, run the function-selection completion, execute the single
//! function the model picked (if any), then run the follow-up completion
//! that phrases the user-facing answer. Every message is persisted the
//! moment it exists, in arrival order.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, info};

use kantoro_core::{
    ChatMessage, ChatProvider, CompletionRequest, FollowUp, FunctionCall, FunctionError,
    KantoroError, MetadataTag, OutputSink, Role,
};
use kantoro_memory::BufferMemory;
use kantoro_plugin::PluginRegistry;
use kantoro_storage::{ConversationStore, StoredMessage};

use crate::prompt;

/// Sampling temperature for the function-selection completion.
pub(crate) const INITIAL_TEMPERATURE: f32 = 0.1;

/// Look up and execute a requested function, folding recoverable failures
/// into the result text.
///
/// Returns the result text together with the function's follow-up policy.
/// An unknown function escalates to [`KantoroError::UnknownFunction`];
/// argument and execution failures become the result so the follow-up
/// completion can explain them to the user.
pub(crate) async fn resolve_function_call(
    registry: &PluginRegistry,
    call: &FunctionCall,
    caller_email: &str,
) -> Result<(String, FollowUp), KantoroError> {
    let Some(spec) = registry.find_definition(&call.name) else {
        return Err(KantoroError::UnknownFunction {
            name: call.name.clone(),
        });
    };
    let follow_up = spec.follow_up.clone();

    let result = match registry.execute(&call.name, &call.arguments, caller_email).await {
        Ok(text) => text,
        Err(FunctionError::Unknown { name }) => {
            return Err(KantoroError::UnknownFunction { name });
        }
        Err(err @ FunctionError::InvalidArguments { .. }) => {
            debug!(error = %err, "folding argument failure into conversation");
            err.to_string()
        }
        Err(FunctionError::Execution { message, .. }) => {
            debug!(function = %call.name, "folding execution failure into conversation");
            message
        }
    };
    Ok((result, follow_up))
}

/// One inbound message to answer, with the caller's identity.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub sender_name: String,
    pub sender_email: String,
    pub thread_id: String,
    /// Restricts the function catalog to one plugin scope. An unknown
    /// scope yields an empty catalog, which forces a plain chat answer.
    pub plugin_scope: Option<String>,
}

/// Runs the single-hop chat cycle against the durable conversation store.
///
/// At most one function call happens per cycle; a function result never
/// triggers a second call. The caller's user message must already be
/// persisted on the thread before [`respond`](ChatEngine::respond) or
/// [`respond_stream`](ChatEngine::respond_stream) runs.
pub struct ChatEngine {
    provider: Arc<dyn ChatProvider>,
    store: Arc<ConversationStore>,
    registry: Arc<PluginRegistry>,
    buffer: Arc<BufferMemory>,
    model: String,
    policy: String,
}

impl ChatEngine {
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        store: Arc<ConversationStore>,
        registry: Arc<PluginRegistry>,
        buffer: Arc<BufferMemory>,
        model: impl Into<String>,
        policy: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            store,
            registry,
            buffer,
            model: model.into(),
            policy: policy.into(),
        }
    }

    /// Answer the turn's user message, returning the persisted final message.
    pub async fn respond(&self, turn: &ChatTurn) -> Result<StoredMessage, KantoroError> {
        let (mut history, initial) = self.initial_completion(turn).await?;

        let Some(call) = initial.function_call.clone().filter(|c| !c.name.is_empty()) else {
            debug!(thread_id = %turn.thread_id, "no function call, initial response is final");
            return Ok(initial);
        };

        let follow_up = self.execute_function_call(turn, &mut history, &call).await?;
        let completion = self
            .provider
            .complete(self.follow_up_request(&history, &follow_up))
            .await?;
        let final_message = self.store.append(&turn.thread_id, &completion.message).await?;

        if follow_up.clear_buffer {
            self.buffer.clear(&turn.sender_email).await;
        }
        Ok(final_message)
    }

    /// Answer the turn's user message, streaming the final answer and the
    /// out-of-band metadata tags into `sink`.
    ///
    /// `user_message` is the already-persisted inbound message; its id and
    /// timestamp go out as the first tags. The identity tags are only
    /// emitted once the initial completion has landed, so a provider
    /// failure surfaces as a clean error with nothing on the stream.
    pub async fn respond_stream(
        &self,
        turn: &ChatTurn,
        user_message: &StoredMessage,
        sink: &mut dyn OutputSink,
    ) -> Result<(), KantoroError> {
        let (mut history, initial) = self.initial_completion(turn).await?;

        sink.write_tag(MetadataTag::ThreadId, &turn.thread_id).await?;
        sink.write_tag(MetadataTag::UserMessageId, &user_message.id.to_string())
            .await?;
        sink.write_tag(MetadataTag::UserMessageCreatedAt, &user_message.created_at)
            .await?;

        let Some(call) = initial.function_call.clone().filter(|c| !c.name.is_empty()) else {
            debug!(thread_id = %turn.thread_id, "no function call, streaming initial response");
            sink.write_tag(MetadataTag::Role, &initial.role.to_string()).await?;
            sink.write_content(&initial.content).await?;
            self.finish_stream(sink, &initial).await?;
            return Ok(());
        };

        let follow_up = self.execute_function_call(turn, &mut history, &call).await?;
        let mut deltas = self
            .provider
            .stream(self.follow_up_request(&history, &follow_up))
            .await?;

        let mut role_seen = false;
        let mut content = String::new();
        while let Some(delta) = deltas.next().await {
            let delta = delta?;
            if let Some(role) = delta.role
                && !role_seen
            {
                sink.write_tag(MetadataTag::Role, &role.to_string()).await?;
                role_seen = true;
            }
            if let Some(fragment) = delta.content
                && !fragment.is_empty()
            {
                // The role tag must precede the first content byte even if
                // the provider never sent a role delta.
                if !role_seen {
                    sink.write_tag(MetadataTag::Role, &Role::Assistant.to_string())
                        .await?;
                    role_seen = true;
                }
                sink.write_content(&fragment).await?;
                content.push_str(&fragment);
            }
        }

        let final_message = self
            .store
            .append(&turn.thread_id, &ChatMessage::assistant(content))
            .await?;
        self.finish_stream(sink, &final_message).await?;

        if follow_up.clear_buffer {
            self.buffer.clear(&turn.sender_email).await;
        }
        Ok(())
    }

    /// Load the thread history and run the function-selection completion,
    /// persisting its response.
    ///
    /// A brand-new thread holds only the just-added user message; the
    /// policy system message is injected fresh on that first turn and never
    /// persisted.
    async fn initial_completion(
        &self,
        turn: &ChatTurn,
    ) -> Result<(Vec<ChatMessage>, StoredMessage), KantoroError> {
        let mut history: Vec<ChatMessage> = self
            .store
            .find_all(&turn.thread_id)
            .await?
            .iter()
            .map(StoredMessage::as_chat_message)
            .collect();

        if history.len() == 1 {
            let system =
                prompt::system_message(&self.policy, &turn.sender_name, &turn.sender_email);
            history.insert(0, system);
        }
        debug!(
            thread_id = %turn.thread_id,
            messages = history.len(),
            "assembled thread history"
        );

        let catalog = self.registry.scoped_catalog(turn.plugin_scope.as_deref());
        let completion = self
            .provider
            .complete(CompletionRequest {
                model: self.model.clone(),
                messages: history.clone(),
                temperature: INITIAL_TEMPERATURE,
                functions: Some(catalog),
            })
            .await?;

        let initial = self.store.append(&turn.thread_id, &completion.message).await?;
        history.push(completion.message);
        Ok((history, initial))
    }

    /// Execute the requested function and persist the function-role message
    /// carrying its result plus the follow-up prompt.
    async fn execute_function_call(
        &self,
        turn: &ChatTurn,
        history: &mut Vec<ChatMessage>,
        call: &FunctionCall,
    ) -> Result<FollowUp, KantoroError> {
        info!(
            thread_id = %turn.thread_id,
            function = %call.name,
            "executing requested function"
        );
        let (result, follow_up) =
            resolve_function_call(&self.registry, call, &turn.sender_email).await?;

        let function_message =
            ChatMessage::function(&call.name, format!("{result}{}", follow_up.prompt));
        self.store.append(&turn.thread_id, &function_message).await?;
        history.push(function_message);
        Ok(follow_up)
    }

    fn follow_up_request(&self, history: &[ChatMessage], follow_up: &FollowUp) -> CompletionRequest {
        CompletionRequest {
            model: follow_up.model.clone().unwrap_or_else(|| self.model.clone()),
            messages: history.to_vec(),
            temperature: follow_up.temperature.unwrap_or(0.0),
            functions: None,
        }
    }

    /// Emit the persisted-final-message tags and terminate the stream.
    async fn finish_stream(
        &self,
        sink: &mut dyn OutputSink,
        final_message: &StoredMessage,
    ) -> Result<(), KantoroError> {
        sink.write_tag(MetadataTag::AiMessageId, &final_message.id.to_string())
            .await?;
        sink.write_tag(MetadataTag::AiMessageCreatedAt, &final_message.created_at)
            .await?;
        sink.close().await
    }
}
