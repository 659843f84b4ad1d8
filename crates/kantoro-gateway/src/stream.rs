// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chunked streaming of the tagged cycle output.
//!
//! The chat cycle writes into a [`ChannelSink`]; the receiver side backs
//! the HTTP response body. The first chunk is awaited before the response
//! status is chosen, so a cycle that fails before producing output still
//! gets a JSON error status instead of an empty 200.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use futures::StreamExt;

use kantoro_chat::{ChannelSink, ChatTurn};
use kantoro_core::KantoroError;
use kantoro_storage::StoredMessage;

use crate::handlers::error_response;
use crate::server::AppState;

/// Run the streaming cycle for an already-persisted user message and
/// return the chunked response.
///
/// The cycle task outlives the response on client disconnect: the sink
/// swallows writes once the receiver is gone, so every message still
/// reaches the store.
pub(crate) async fn respond(
    state: AppState,
    turn: ChatTurn,
    user_message: StoredMessage,
) -> Response {
    let (mut sink, mut rx) = ChannelSink::new(64);
    let engine = Arc::clone(&state.engine);
    let cycle = tokio::spawn(async move {
        engine.respond_stream(&turn, &user_message, &mut sink).await
    });

    // The first chunk is the threadId tag, emitted only after the initial
    // completion has been persisted.
    let Some(first) = rx.recv().await else {
        let err = match cycle.await {
            Ok(Ok(())) => {
                KantoroError::Internal("chat cycle closed the stream without output".to_string())
            }
            Ok(Err(e)) => e,
            Err(join_err) => KantoroError::Internal(format!("chat cycle task failed: {join_err}")),
        };
        return error_response(&err);
    };

    let chunks = futures::stream::once(futures::future::ready(first))
        .chain(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|chunk| (chunk, rx))
        }))
        .map(|chunk| Ok::<_, Infallible>(Bytes::from(chunk)));

    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(chunks),
    )
        .into_response()
}
