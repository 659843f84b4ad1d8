// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion-provider trait for LLM integrations.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::KantoroError;
use crate::types::{Completion, CompletionDelta, CompletionRequest};

/// A live sequence of completion deltas.
pub type CompletionStream =
    Pin<Box<dyn Stream<Item = Result<CompletionDelta, KantoroError>> + Send>>;

/// Adapter for chat-completion providers.
///
/// The orchestrator calls `complete` for the initial decision (where a
/// function call may appear) and `stream` for the incremental follow-up.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Sends a completion request and returns the full response.
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, KantoroError>;

    /// Sends a completion request and returns a stream of deltas.
    async fn stream(&self, request: CompletionRequest) -> Result<CompletionStream, KantoroError>;
}
