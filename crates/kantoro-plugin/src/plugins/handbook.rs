// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handbook knowledge-base plugin backed by a document search index.
//!
//! Unlike the other plugins this one is a catch-all: its definition tells
//! the model to call it by default, so most turns in a handbook-scoped
//! session route through the index.

use std::sync::Arc;

use async_trait::async_trait;
use kantoro_core::{FollowUp, FunctionDefinition, FunctionError, FunctionSpec, SearchIndex};
use serde::Deserialize;
use tracing::info;

use crate::plugins::parse_args;
use crate::registry::CapabilityPlugin;

const SCOPE: &str = "Handbook";
const FN_GET_HANDBOOK_INFORMATION: &str = "Handbook-getHandbookInformation";

const SEARCH_TOP: usize = 4;
const BLOCK_SEPARATOR: &str = "\n--------------\n";
const NO_RESULTS: &str = "No CONTEXT/Results found";
const HANDBOOK_FAILURE: &str = "Unable to fetch handbook information";

#[derive(Debug, Deserialize)]
struct HandbookArgs {
    #[serde(default)]
    query: String,
    #[serde(rename = "originalUserMessage", default)]
    original_user_message: String,
}

/// Answers questions from the indexed employee handbook.
pub struct HandbookPlugin {
    search: Arc<dyn SearchIndex>,
    index: String,
}

impl HandbookPlugin {
    pub fn new(search: Arc<dyn SearchIndex>, index: impl Into<String>) -> Self {
        Self {
            search,
            index: index.into(),
        }
    }

    async fn get_handbook_information(&self, args: HandbookArgs) -> Result<String, FunctionError> {
        info!(query = %args.query, "searching handbook");
        let hits = self
            .search
            .search(&self.index, &args.query, SEARCH_TOP)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "handbook search failed");
                FunctionError::execution(FN_GET_HANDBOOK_INFORMATION, HANDBOOK_FAILURE)
            })?;

        let context = if hits.is_empty() {
            NO_RESULTS.to_string()
        } else {
            hits.iter()
                .map(|hit| format!("metadata: {}\ncontent: {}", hit.title, hit.content))
                .collect::<Vec<_>>()
                .join(BLOCK_SEPARATOR)
        };

        // The query echo lets the follow-up completion answer in the language
        // of the user's original message.
        Ok(format!(
            "{context}\n\nquery: {}\noriginalUserMessage: {}",
            args.query, args.original_user_message
        ))
    }
}

#[async_trait]
impl CapabilityPlugin for HandbookPlugin {
    fn scope(&self) -> &str {
        SCOPE
    }

    fn definitions(&self) -> Vec<FunctionSpec> {
        vec![FunctionSpec {
            definition: FunctionDefinition {
                name: FN_GET_HANDBOOK_INFORMATION.to_string(),
                description: concat!(
                    "This function has huge knowledge base and can answer variety of questions, ",
                    "Always call this function to get answer. ",
                    "When this plugin is selected, call it by default to get all kind of answers",
                )
                .to_string(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "User message or query/question which will be used for vector similarity search"
                        },
                        "originalUserMessage": {
                            "type": "string",
                            "description": "User message or query/question in original language"
                        },
                    },
                    "required": ["query"],
                }),
            },
            follow_up: FollowUp {
                prompt: concat!(
                    "\n\n",
                    "Answer must be provided from the above context only. If you find engaging questions or queries, ask for clarification.",
                    "\nFrom above context, if you can ask follow up question for better clarification, ask for it.",
                    "\nIt is recommended to ask follow up questions to help user in detail.",
                    "\nIf you don't know the answer, just say that you don't know, don't try to make up an answer.",
                    "\nAlways include links and sources.",
                    "\nAnswer must be in the same language as the user's original message.",
                )
                .to_string(),
                temperature: Some(0.0),
                model: Some("gpt-4".to_string()),
                clear_buffer: false,
            },
        }]
    }

    async fn invoke(
        &self,
        method: &str,
        args_json: &str,
        _caller_email: &str,
    ) -> Result<String, FunctionError> {
        match method {
            "getHandbookInformation" => {
                let args = parse_args(FN_GET_HANDBOOK_INFORMATION, args_json)?;
                self.get_handbook_information(args).await
            }
            _ => Err(FunctionError::Unknown {
                name: format!("{SCOPE}-{method}"),
            }),
        }
    }
}
