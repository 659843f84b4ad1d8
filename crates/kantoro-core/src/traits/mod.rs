// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the orchestrator and its collaborators.
//!
//! All traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod provider;
pub mod search;
pub mod sink;

pub use provider::{ChatProvider, CompletionStream};
pub use search::SearchIndex;
pub use sink::OutputSink;
