// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in capability plugins.

use kantoro_core::FunctionError;
use serde::de::DeserializeOwned;

pub mod cvs;
pub mod handbook;
pub mod joan;

/// Parse the model-produced argument JSON into a typed argument struct.
///
/// Malformed JSON or missing required fields come back as
/// [`FunctionError::InvalidArguments`] so the orchestrator can fold the
/// problem into the conversation instead of aborting the cycle.
pub(crate) fn parse_args<T: DeserializeOwned>(
    function: &str,
    args_json: &str,
) -> Result<T, FunctionError> {
    serde_json::from_str(args_json).map_err(|e| FunctionError::invalid_arguments(function, e))
}
