// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./kantoro.toml` > `~/.config/kantoro/kantoro.toml` > `/etc/kantoro/kantoro.toml`
//! with environment variable overrides via `KANTORO_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::KantoroConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/kantoro/kantoro.toml` (system-wide)
/// 3. `~/.config/kantoro/kantoro.toml` (user XDG config)
/// 4. `./kantoro.toml` (local directory)
/// 5. `KANTORO_*` environment variables
pub fn load_config() -> Result<KantoroConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KantoroConfig::default()))
        .merge(Toml::file("/etc/kantoro/kantoro.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("kantoro/kantoro.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("kantoro.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a specific TOML string only (no XDG lookup).
///
/// Used for testing and explicit config file specification.
pub fn load_config_from_str(toml_content: &str) -> Result<KantoroConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KantoroConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<KantoroConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KantoroConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// CRITICAL: Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `KANTORO_OPENAI_API_KEY` must
/// map to `openai.api_key`, not `openai.api.key`.
fn env_provider() -> Env {
    Env::prefixed("KANTORO_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: KANTORO_OPENAI_PRIMARY_DEPLOYMENT -> "openai_primary_deployment"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("openai_", "openai.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("gateway_", "gateway.", 1)
            .replacen("search_", "search.", 1)
            .replacen("joan_", "joan.", 1);
        mapped.into()
    })
}
