// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Kantoro chat backend.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Kantoro workspace: the message and
//! function-catalog vocabulary, the completion-provider and output-sink
//! seams, and the fatal/recoverable error split the orchestrator relies on.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{FunctionError, KantoroError};
pub use traits::{ChatProvider, CompletionStream, OutputSink, SearchIndex};
pub use types::{
    ChatMessage, Completion, CompletionDelta, CompletionRequest, FollowUp, FunctionCall,
    FunctionDefinition, FunctionSpec, MetadataTag, Role, SearchHit, TokenUsage,
};
