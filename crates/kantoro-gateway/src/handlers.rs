// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Thread and message routes under `/v1`, plus the unauthenticated
//! health route. Thread and message rows serialize straight from the
//! storage models, so the response shapes are the storage shapes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use kantoro_chat::ChatTurn;
use kantoro_core::{ChatMessage, KantoroError};
use kantoro_memory::MAX_BUFFERED_USER_MESSAGES;
use kantoro_storage::Thread;

use crate::server::AppState;
use crate::stream;

/// Request body for POST /v1/threads.
#[derive(Debug, Deserialize)]
pub struct CreateThreadRequest {
    /// Optional thread title.
    #[serde(default)]
    pub title: Option<String>,
    /// Optional plugin scope restricting the thread's function catalog.
    #[serde(default)]
    pub plugin: Option<String>,
    /// Display name of the sender.
    pub sender_name: String,
    /// Email identifying the sender.
    pub sender_email: String,
    /// The first user message of the thread.
    pub content: String,
}

/// Request body for POST /v1/threads/{id}/messages.
#[derive(Debug, Deserialize)]
pub struct AppendMessageRequest {
    /// Display name of the sender.
    pub sender_name: String,
    /// Email identifying the sender.
    pub sender_email: String,
    /// The user message to answer.
    pub content: String,
}

/// Query parameters for GET /v1/threads.
#[derive(Debug, Deserialize)]
pub struct ListThreadsQuery {
    /// Email whose threads to list.
    pub user_email: String,
}

/// Request body for POST /v1/chat.
#[derive(Debug, Deserialize)]
pub struct BufferedChatRequest {
    /// Display name of the sender.
    pub sender_name: String,
    /// Email keying the sender's session buffer.
    pub sender_email: String,
    /// The user message to answer.
    pub content: String,
    /// Optional plugin scope restricting the function catalog.
    #[serde(default)]
    pub plugin: Option<String>,
}

/// Request body for DELETE /v1/chat.
#[derive(Debug, Deserialize)]
pub struct DeleteChatRequest {
    /// Email whose buffer entry to drop.
    pub sender_email: String,
}

/// Response body for POST /v1/chat.
#[derive(Debug, Serialize)]
pub struct BufferedChatResponse {
    /// Assistant reply with the session-counter footer appended.
    pub text: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status string.
    pub status: String,
    /// Binary version.
    pub version: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// GET /health
///
/// Unauthenticated liveness probe.
pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /v1/threads
///
/// Creates a thread, persists the first user message, and streams the
/// tagged cycle output as a chunked text body.
pub async fn create_thread(
    State(state): State<AppState>,
    Json(body): Json<CreateThreadRequest>,
) -> Response {
    let thread = match state
        .store
        .create_thread(&body.sender_email, body.title, body.plugin)
        .await
    {
        Ok(thread) => thread,
        Err(e) => return error_response(&e),
    };
    info!(thread_id = %thread.id, user = %body.sender_email, "thread created");

    start_cycle(state, thread, body.sender_name, body.sender_email, body.content).await
}

/// GET /v1/threads?user_email=
///
/// Lists the caller's live threads, newest first.
pub async fn list_threads(
    State(state): State<AppState>,
    Query(query): Query<ListThreadsQuery>,
) -> Response {
    match state.store.list_threads(&query.user_email).await {
        Ok(threads) => Json(threads).into_response(),
        Err(e) => error_response(&e),
    }
}

/// DELETE /v1/threads/{id}
///
/// Soft-deletes a thread. Its messages stay on disk but the thread
/// disappears from listings and lookups.
pub async fn delete_thread(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Response {
    match state.store.delete_thread(&thread_id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => not_found(),
        Err(e) => error_response(&e),
    }
}

/// GET /v1/threads/{id}/messages
///
/// The chat-visible transcript: user and assistant rows with non-empty
/// content, in arrival order.
pub async fn get_thread_messages(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Response {
    match state.store.find_thread(&thread_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return not_found(),
        Err(e) => return error_response(&e),
    }
    match state.store.find_chat_only(&thread_id).await {
        Ok(messages) => Json(messages).into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST /v1/threads/{id}/messages
///
/// Appends a user message to an existing thread and streams the tagged
/// cycle output. Rejected with 429 once the thread holds the configured
/// number of user messages.
pub async fn append_message(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Json(body): Json<AppendMessageRequest>,
) -> Response {
    let thread = match state.store.find_thread(&thread_id).await {
        Ok(Some(thread)) => thread,
        Ok(None) => return not_found(),
        Err(e) => return error_response(&e),
    };

    if state.max_messages_per_thread > 0 {
        let count = match state.store.count_user_messages(&thread.id).await {
            Ok(count) => count,
            Err(e) => return error_response(&e),
        };
        debug!(thread_id = %thread.id, count, "user message count");
        if count >= i64::from(state.max_messages_per_thread) {
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorResponse {
                    error: format!(
                        "You can only send {} messages to a thread",
                        state.max_messages_per_thread
                    ),
                }),
            )
                .into_response();
        }
    }

    start_cycle(state, thread, body.sender_name, body.sender_email, body.content).await
}

/// POST /v1/chat
///
/// The buffered session variant: no thread, nothing on disk. The reply
/// carries a footer telling the caller where the session counter
/// stands. A counter of zero or at the cap means the next message
/// starts a fresh session.
pub async fn buffered_chat(
    State(state): State<AppState>,
    Json(body): Json<BufferedChatRequest>,
) -> Response {
    info!(sender = %body.sender_name, user = %body.sender_email, "buffered chat message");
    let reply = match state
        .buffered
        .respond(
            &body.sender_name,
            &body.sender_email,
            &body.content,
            body.plugin.as_deref(),
        )
        .await
    {
        Ok(reply) => reply,
        Err(e) => return error_response(&e),
    };

    let count = state.buffer.user_message_count(&body.sender_email).await;
    let footer = if count == 0 || count >= MAX_BUFFERED_USER_MESSAGES {
        "\n\n*WARNING! NEW SESSION* WILL START With your next message\n\
         All Previous chat history will be ignored."
            .to_string()
    } else {
        format!("\n\n*{count}* of {MAX_BUFFERED_USER_MESSAGES}.")
    };
    Json(BufferedChatResponse {
        text: format!("{reply}{footer}"),
    })
    .into_response()
}

/// DELETE /v1/chat
///
/// Drops the caller's session buffer. Replies with the number of user
/// messages the dropped entry held.
pub async fn delete_buffered_chat(
    State(state): State<AppState>,
    Json(body): Json<DeleteChatRequest>,
) -> Response {
    let count = state.buffer.user_message_count(&body.sender_email).await;
    state.buffer.clear(&body.sender_email).await;
    info!(user = %body.sender_email, count, "session buffer dropped");
    format!("Chat deleted, message count {count}").into_response()
}

/// Persist the inbound user message and hand the turn to the streaming
/// cycle. The thread's plugin column scopes the function catalog.
async fn start_cycle(
    state: AppState,
    thread: Thread,
    sender_name: String,
    sender_email: String,
    content: String,
) -> Response {
    let user_message = match state.store.append(&thread.id, &ChatMessage::user(content)).await {
        Ok(message) => message,
        Err(e) => return error_response(&e),
    };

    let turn = ChatTurn {
        sender_name,
        sender_email,
        thread_id: thread.id,
        plugin_scope: thread.plugin,
    };
    stream::respond(state, turn, user_message).await
}

pub(crate) fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "thread not found".to_string(),
        }),
    )
        .into_response()
}

/// Map a cycle or storage failure to a generic JSON error status. The
/// detail stays in the logs.
pub(crate) fn error_response(err: &KantoroError) -> Response {
    let (status, message) = match err {
        KantoroError::Provider { .. } => {
            (StatusCode::BAD_GATEWAY, "completion provider request failed")
        }
        KantoroError::UnknownFunction { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "the model requested an unknown function",
        ),
        KantoroError::Storage { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "conversation storage failed")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal error"),
    };
    error!(error = %err, "request failed");
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}
