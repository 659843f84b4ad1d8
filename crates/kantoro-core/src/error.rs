// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Kantoro chat backend.
//!
//! Two enums split the failure space the way the orchestrator consumes it:
//! [`KantoroError`] for fatal conditions that abort a chat cycle, and
//! [`FunctionError`] for plugin-boundary failures. Of the latter, only
//! `Unknown` is fatal; the other variants are folded back into the
//! conversation as text so the follow-up completion can explain the problem
//! to the user.

use thiserror::Error;

/// The primary error type used across the Kantoro crates.
#[derive(Debug, Error)]
pub enum KantoroError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Completion provider errors (API failure, malformed response, exhausted retries).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Transport errors between the orchestrator and the caller (sink closed, bind failure).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The model requested a function that no registered plugin provides.
    #[error("unknown function: {name}")]
    UnknownFunction { name: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Failure of a single function execution at the plugin boundary.
///
/// `InvalidArguments` and `Execution` are recoverable: the orchestrator folds
/// their text into the function-result message and continues the cycle.
/// `Unknown` escalates to [`KantoroError::UnknownFunction`].
#[derive(Debug, Error)]
pub enum FunctionError {
    /// No plugin scope or method matches the qualified name.
    #[error("no plugin registered for function {name}")]
    Unknown { name: String },

    /// The call's argument JSON is malformed or misses required fields.
    #[error("invalid arguments for {function}: {message}")]
    InvalidArguments { function: String, message: String },

    /// The plugin ran and failed; `message` is the user-facing text.
    #[error("{function} failed: {message}")]
    Execution { function: String, message: String },
}

impl FunctionError {
    /// Convenience constructor for argument-parse failures.
    pub fn invalid_arguments(function: &str, err: impl std::fmt::Display) -> Self {
        Self::InvalidArguments {
            function: function.to_string(),
            message: err.to_string(),
        }
    }

    /// Convenience constructor for execution failures.
    pub fn execution(function: &str, message: impl Into<String>) -> Self {
        Self::Execution {
            function: function.to_string(),
            message: message.into(),
        }
    }
}
