// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `kantoro config` command implementation.
//!
//! Prints the effective configuration as TOML after the XDG hierarchy,
//! environment overrides, and defaults have been applied. Secret values
//! are masked so the output is safe to paste into bug reports.

use kantoro_config::model::KantoroConfig;
use kantoro_core::KantoroError;

/// Runs the `kantoro config` command.
pub fn run_config(config: &KantoroConfig) -> Result<(), KantoroError> {
    let mut shown = config.clone();
    redact_secrets(&mut shown);

    let rendered = toml::to_string_pretty(&shown)
        .map_err(|e| KantoroError::Internal(format!("failed to render config: {e}")))?;
    println!("{rendered}");
    Ok(())
}

/// Masks configured secrets, keeping unset ones unset so the output still
/// shows which credentials are missing.
fn redact_secrets(config: &mut KantoroConfig) {
    for secret in [
        &mut config.openai.api_key,
        &mut config.search.api_key,
        &mut config.joan.client_secret,
        &mut config.gateway.bearer_token,
    ] {
        if secret.is_some() {
            *secret = Some("[redacted]".to_string());
        }
    }
}
