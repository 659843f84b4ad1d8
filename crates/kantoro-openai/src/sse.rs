// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE parser for Azure OpenAI streaming chat completions.
//!
//! Azure emits unnamed `data:` events, each carrying one JSON chunk, and
//! terminates the stream with the literal `data: [DONE]` sentinel. The
//! `eventsource-stream` crate handles SSE framing; this module handles the
//! sentinel and chunk deserialization.

use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures::stream::{Stream, StreamExt};
use kantoro_core::KantoroError;

use crate::types::ChatCompletionChunk;

/// Terminal sentinel sent as the final data event of a stream.
const DONE_SENTINEL: &str = "[DONE]";

/// Parses a reqwest streaming response into a stream of completion chunks.
///
/// The `[DONE]` sentinel is consumed silently; the stream ends when the
/// connection closes. Malformed chunk payloads surface as provider errors
/// rather than ending the stream, so a single bad frame does not discard the
/// frames behind it.
pub fn parse_chunk_stream(
    response: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk, KantoroError>> + Send>> {
    let byte_stream = response.bytes_stream();
    let event_stream = byte_stream.eventsource();

    let mapped = event_stream.filter_map(|result| async move {
        match result {
            Ok(event) => {
                if event.data.trim() == DONE_SENTINEL {
                    return None;
                }
                let parsed = serde_json::from_str::<ChatCompletionChunk>(&event.data).map_err(
                    |e| KantoroError::Provider {
                        message: format!("failed to parse completion chunk: {e}"),
                        source: Some(Box::new(e)),
                    },
                );
                Some(parsed)
            }
            Err(e) => Some(Err(KantoroError::Provider {
                message: format!("SSE stream error: {e}"),
                source: None,
            })),
        }
    });

    Box::pin(mapped)
}
