// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Search-index trait consumed by the document-search plugins.

use async_trait::async_trait;

use crate::error::KantoroError;
use crate::types::SearchHit;

/// A ranked-retrieval backend over a named index.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Return the top `top` hits for `query` against `index`.
    async fn search(
        &self,
        index: &str,
        query: &str,
        top: usize,
    ) -> Result<Vec<SearchHit>, KantoroError>;
}
