// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock capability plugin for orchestrator tests.
//!
//! `MockPlugin` implements `CapabilityPlugin` with per-method scripted
//! outcomes and call capture, so tests can drive every branch of the
//! function-calling cycle without real plugin backends.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use kantoro_core::{FollowUp, FunctionDefinition, FunctionError, FunctionSpec};
use kantoro_plugin::CapabilityPlugin;

/// What a scripted method returns when invoked.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// The method succeeds with this result text.
    Success(String),
    /// The method rejects its arguments.
    InvalidArguments(String),
    /// The method runs and fails with this user-facing text.
    Failure(String),
}

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub method: String,
    pub arguments: String,
    pub caller_email: String,
}

/// A capability plugin with scripted per-method outcomes.
///
/// Methods without a scripted outcome report themselves as unknown, which
/// is the shape of a catalog entry the plugin does not actually implement.
pub struct MockPlugin {
    scope: String,
    specs: Vec<FunctionSpec>,
    outcomes: HashMap<String, MockOutcome>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockPlugin {
    /// Create a plugin exposing the given specs under `scope`.
    pub fn new(scope: impl Into<String>, specs: Vec<FunctionSpec>) -> Self {
        Self {
            scope: scope.into(),
            specs,
            outcomes: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Script what `method` returns when invoked.
    pub fn script(mut self, method: impl Into<String>, outcome: MockOutcome) -> Self {
        self.outcomes.insert(method.into(), outcome);
        self
    }

    /// Every invocation this plugin has received, in order.
    pub async fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl CapabilityPlugin for MockPlugin {
    fn scope(&self) -> &str {
        &self.scope
    }

    fn definitions(&self) -> Vec<FunctionSpec> {
        self.specs.clone()
    }

    async fn invoke(
        &self,
        method: &str,
        args_json: &str,
        caller_email: &str,
    ) -> Result<String, FunctionError> {
        self.calls.lock().await.push(MockCall {
            method: method.to_string(),
            arguments: args_json.to_string(),
            caller_email: caller_email.to_string(),
        });

        let qualified = format!("{}-{method}", self.scope);
        match self.outcomes.get(method) {
            Some(MockOutcome::Success(text)) => Ok(text.clone()),
            Some(MockOutcome::InvalidArguments(message)) => {
                Err(FunctionError::invalid_arguments(&qualified, message))
            }
            Some(MockOutcome::Failure(message)) => {
                Err(FunctionError::execution(&qualified, message.clone()))
            }
            None => Err(FunctionError::Unknown { name: qualified }),
        }
    }
}

/// A minimal function spec for registry and orchestrator tests.
pub fn function_spec(name: &str, follow_up: FollowUp) -> FunctionSpec {
    FunctionSpec {
        definition: FunctionDefinition {
            name: name.to_string(),
            description: format!("test function {name}"),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {},
            }),
        },
        follow_up,
    }
}
