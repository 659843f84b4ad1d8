// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Output-sink trait: the typed channel the orchestrator streams into.

use async_trait::async_trait;

use crate::error::KantoroError;
use crate::types::MetadataTag;

/// An ordered text stream toward the original caller.
///
/// Content fragments and metadata tags share one stream; transports emit
/// tags in the literal `[[<tag>=<value>]]` syntax via
/// [`MetadataTag::render`]. The orchestrator closes the sink explicitly
/// after the final tag; writes after `close` are an error.
#[async_trait]
pub trait OutputSink: Send {
    /// Append a content fragment.
    async fn write_content(&mut self, text: &str) -> Result<(), KantoroError>;

    /// Append a metadata tag.
    async fn write_tag(&mut self, tag: MetadataTag, value: &str) -> Result<(), KantoroError>;

    /// Terminate the stream.
    async fn close(&mut self) -> Result<(), KantoroError>;
}
