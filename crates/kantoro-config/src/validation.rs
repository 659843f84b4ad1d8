// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as valid bind addresses, known log levels, and parseable timezones.

use crate::diagnostic::ConfigError;
use crate::model::KantoroConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &KantoroConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "agent.log_level must be one of {}, got `{}`",
                LOG_LEVELS.join(", "),
                config.agent.log_level
            ),
        });
    }

    // Validate database_path is not empty
    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    // Validate gateway host is not empty and looks like an IP or hostname
    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("gateway.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.gateway.enabled && config.gateway.port == 0 {
        errors.push(ConfigError::Validation {
            message: "gateway.port must be non-zero when the gateway is enabled".to_string(),
        });
    }

    for (key, value) in [
        ("openai.api_version", &config.openai.api_version),
        ("openai.primary_deployment", &config.openai.primary_deployment),
        (
            "openai.buffered_deployment",
            &config.openai.buffered_deployment,
        ),
        ("search.cv_index", &config.search.cv_index),
        ("search.handbook_index", &config.search.handbook_index),
    ] {
        if value.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("{key} must not be empty"),
            });
        }
    }

    // Validate joan.timezone parses as an IANA timezone
    if config.joan.timezone.parse::<chrono_tz::Tz>().is_err() {
        errors.push(ConfigError::Validation {
            message: format!(
                "joan.timezone `{}` is not a valid IANA timezone",
                config.joan.timezone
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
