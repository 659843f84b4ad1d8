// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Employee CV lookup plugin backed by a document search index.

use std::sync::Arc;

use async_trait::async_trait;
use kantoro_core::{FollowUp, FunctionDefinition, FunctionError, FunctionSpec, SearchIndex};
use serde::Deserialize;
use tracing::info;

use crate::plugins::parse_args;
use crate::registry::CapabilityPlugin;

const SCOPE: &str = "CVs";
const FN_GET_WORK_DETAILS: &str = "CVs-getEmployeesWorkDetails";

const SEARCH_TOP: usize = 4;
const CV_FAILURE: &str = "Unable to fetch employee work experience details";

#[derive(Debug, Deserialize)]
struct WorkDetailsArgs {
    #[serde(rename = "completeUserMessage", default)]
    complete_user_message: String,
}

/// Answers questions about employee work experience from indexed CVs.
pub struct CvsPlugin {
    search: Arc<dyn SearchIndex>,
    index: String,
}

impl CvsPlugin {
    pub fn new(search: Arc<dyn SearchIndex>, index: impl Into<String>) -> Self {
        Self {
            search,
            index: index.into(),
        }
    }

    async fn get_work_details(&self, args: WorkDetailsArgs) -> Result<String, FunctionError> {
        info!(query = %args.complete_user_message, "searching employee CVs");
        let hits = self
            .search
            .search(&self.index, &args.complete_user_message, SEARCH_TOP)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "CV search failed");
                FunctionError::execution(FN_GET_WORK_DETAILS, CV_FAILURE)
            })?;

        let blocks: Vec<String> = hits
            .iter()
            .map(|hit| {
                format!(
                    "\nEmployee CV File Name: {}\nEmployee CV File Content START:\n{}\n\nEmployee CV File Content END\n{}\n",
                    hit.title,
                    collapse_newlines(&hit.content),
                    "=".repeat(60),
                )
            })
            .collect();
        Ok(blocks.join("\n"))
    }
}

/// Collapses runs of newline characters so each CV reads as a compact block.
fn collapse_newlines(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut in_break = false;
    for c in content.chars() {
        if c == '\n' || c == '\r' {
            if !in_break {
                out.push('\n');
                in_break = true;
            }
        } else {
            out.push(c);
            in_break = false;
        }
    }
    out
}

#[async_trait]
impl CapabilityPlugin for CvsPlugin {
    fn scope(&self) -> &str {
        SCOPE
    }

    fn definitions(&self) -> Vec<FunctionSpec> {
        vec![FunctionSpec {
            definition: FunctionDefinition {
                name: FN_GET_WORK_DETAILS.to_string(),
                description:
                    "Get the employees professional work experience context/details from Vector Database"
                        .to_string(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "completeUserMessage": {
                            "type": "string",
                            "description": "Complete User message or query/question which will be used for vector similarity search"
                        },
                    },
                }),
            },
            follow_up: FollowUp {
                prompt: concat!(
                    "\n\n\n",
                    "Look at user question and look at employee work experience above see if you can find answer from above context,",
                    "\nif you don't find answer within context, say it do not know the answer.",
                )
                .to_string(),
                temperature: Some(0.7),
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
            "getEmployeesWorkDetails" => {
                let args = parse_args(FN_GET_WORK_DETAILS, args_json)?;
                self.get_work_details(args).await
            }
            _ => Err(FunctionError::Unknown {
                name: format!("{SCOPE}-{method}"),
            }),
        }
    }
}
