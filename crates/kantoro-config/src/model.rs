// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Kantoro chat backend.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Kantoro configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KantoroConfig {
    /// Assistant identity and conversation behavior settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Azure OpenAI provider settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Cognitive search settings used by the document plugins.
    #[serde(default)]
    pub search: SearchConfig,

    /// Joan workplace API settings used by the desk/parking plugin.
    #[serde(default)]
    pub joan: JoanConfig,
}

/// Assistant identity and conversation behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the assistant.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Inline system prompt string. Overridden by `system_prompt_path` if both set.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Path to a markdown file containing the system prompt.
    /// Takes precedence over `system_prompt` if both are set.
    #[serde(default)]
    pub system_prompt_path: Option<String>,

    /// Maximum user messages accepted per thread. 0 disables the limit.
    #[serde(default = "default_max_messages_per_thread")]
    pub max_messages_per_thread: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            system_prompt: None,
            system_prompt_path: None,
            max_messages_per_thread: default_max_messages_per_thread(),
        }
    }
}

fn default_agent_name() -> String {
    "kantoro".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_messages_per_thread() -> u32 {
    30
}

/// Azure OpenAI provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// Azure OpenAI resource endpoint, e.g. `https://myresource.openai.azure.com`.
    /// `None` leaves the provider unconfigured; `serve` refuses to start without it.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Azure OpenAI API key. `None` falls back to the `AZURE_OPENAI_API_KEY`
    /// environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Azure OpenAI REST API version string.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Deployment used for the initial completion of every turn.
    #[serde(default = "default_primary_deployment")]
    pub primary_deployment: String,

    /// Deployment used by the buffered (non-durable) conversation mode.
    #[serde(default = "default_buffered_deployment")]
    pub buffered_deployment: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            api_version: default_api_version(),
            primary_deployment: default_primary_deployment(),
            buffered_deployment: default_buffered_deployment(),
        }
    }
}

fn default_api_version() -> String {
    "2023-07-01-preview".to_string()
}

fn default_primary_deployment() -> String {
    "gpt-4-32k".to_string()
}

fn default_buffered_deployment() -> String {
    "gpt-4".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("kantoro").join("kantoro.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("kantoro.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Serve the HTTP gateway. When false, `serve` starts without a listener.
    #[serde(default = "default_gateway_enabled")]
    pub enabled: bool,

    /// Address to bind the gateway listener to.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// TCP port for the gateway listener.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Static bearer token required on every request. `None` disables
    /// authentication, which is only sensible behind a trusted proxy.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: default_gateway_enabled(),
            host: default_gateway_host(),
            port: default_gateway_port(),
            bearer_token: None,
        }
    }
}

fn default_gateway_enabled() -> bool {
    true
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8420
}

/// Azure Cognitive Search configuration.
///
/// Backs the CV and handbook document plugins. Leaving `endpoint` unset
/// skips registration of both plugins at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Search service endpoint, e.g. `https://myservice.search.windows.net`.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Search service admin or query key.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Search REST API version string.
    #[serde(default = "default_search_api_version")]
    pub api_version: String,

    /// Index holding employee CV documents.
    #[serde(default = "default_cv_index")]
    pub cv_index: String,

    /// Index holding handbook knowledge-base documents.
    #[serde(default = "default_handbook_index")]
    pub handbook_index: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            api_version: default_search_api_version(),
            cv_index: default_cv_index(),
            handbook_index: default_handbook_index(),
        }
    }
}

fn default_search_api_version() -> String {
    "2023-07-01-Preview".to_string()
}

fn default_cv_index() -> String {
    "employee-cvs".to_string()
}

fn default_handbook_index() -> String {
    "handbook".to_string()
}

/// Joan workplace API configuration.
///
/// Credentials for the desk and parking reservation plugin. Leaving
/// `client_id` or `client_secret` unset skips plugin registration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JoanConfig {
    /// Joan portal base URL.
    #[serde(default = "default_joan_endpoint")]
    pub endpoint: String,

    /// OAuth client id for the client-credentials grant.
    #[serde(default)]
    pub client_id: Option<String>,

    /// OAuth client secret for the client-credentials grant.
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Building scoping every desk and parking query.
    #[serde(default)]
    pub building_id: Option<String>,

    /// Floor scoping desk searches within the building.
    #[serde(default)]
    pub floor_id: Option<String>,

    /// IANA timezone used to resolve reservation slot times.
    #[serde(default = "default_joan_timezone")]
    pub timezone: String,
}

impl Default for JoanConfig {
    fn default() -> Self {
        Self {
            endpoint: default_joan_endpoint(),
            client_id: None,
            client_secret: None,
            building_id: None,
            floor_id: None,
            timezone: default_joan_timezone(),
        }
    }
}

fn default_joan_endpoint() -> String {
    "https://portal.getjoan.com".to_string()
}

fn default_joan_timezone() -> String {
    "Europe/Amsterdam".to_string()
}
