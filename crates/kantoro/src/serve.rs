// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `kantoro serve` command implementation.
//!
//! Starts the full chat backend: SQLite conversation store, Azure OpenAI
//! provider, capability plugin registry, session buffer, and the HTTP
//! gateway. Supports graceful shutdown via signal handlers.

use std::sync::Arc;

use tracing::{error, info, warn};

use kantoro_chat::{load_policy, BufferedChatEngine, ChatEngine};
use kantoro_config::model::KantoroConfig;
use kantoro_core::{ChatProvider, KantoroError, SearchIndex};
use kantoro_gateway::{AppState, AuthConfig, Gateway, ServerConfig};
use kantoro_memory::BufferMemory;
use kantoro_openai::OpenAiProvider;
use kantoro_plugin::{CvsPlugin, HandbookPlugin, JoanPlugin, PluginRegistry, SearchIndexClient};
use kantoro_storage::ConversationStore;

use crate::shutdown;

/// Builds the capability plugin registry from the configured credentials.
///
/// A plugin whose config section is incomplete is skipped with a warning;
/// an empty registry is valid and leaves the assistant in plain-chat mode.
pub(crate) fn build_registry(config: &KantoroConfig) -> Result<PluginRegistry, KantoroError> {
    let mut builder = PluginRegistry::builder();

    if config.joan.client_id.is_some() && config.joan.client_secret.is_some() {
        let joan = JoanPlugin::new(&config.joan)?;
        builder = builder.register(Arc::new(joan));
        info!("joan plugin registered");
    } else {
        warn!("joan plugin skipped (no client_id/client_secret configured)");
    }

    if config.search.endpoint.is_some() {
        let search: Arc<dyn SearchIndex> = Arc::new(SearchIndexClient::new(&config.search)?);
        builder = builder
            .register(Arc::new(CvsPlugin::new(
                Arc::clone(&search),
                config.search.cv_index.clone(),
            )))
            .register(Arc::new(HandbookPlugin::new(
                search,
                config.search.handbook_index.clone(),
            )));
        info!(
            cv_index = config.search.cv_index.as_str(),
            handbook_index = config.search.handbook_index.as_str(),
            "document plugins registered"
        );
    } else {
        warn!("document plugins skipped (no search endpoint configured)");
    }

    let registry = builder.build()?;
    info!(
        plugins = registry.len(),
        functions = registry.function_definitions().len(),
        "plugin registry initialized"
    );
    Ok(registry)
}

/// Runs the `kantoro serve` command.
///
/// Wires the conversation store, provider, plugins, and both chat engines,
/// then serves the HTTP gateway until a shutdown signal arrives.
pub async fn run_serve(config: KantoroConfig) -> Result<(), KantoroError> {
    // Initialize tracing subscriber.
    init_tracing(&config.agent.log_level);

    info!("starting kantoro serve");

    // Open the conversation store (runs migrations).
    let store = Arc::new(ConversationStore::open(&config.storage).await?);
    info!(
        path = config.storage.database_path.as_str(),
        "conversation store ready"
    );

    // Initialize the Azure OpenAI provider.
    let provider: Arc<dyn ChatProvider> = {
        let p = OpenAiProvider::new(&config.openai).map_err(|e| {
            error!(error = %e, "failed to initialize Azure OpenAI provider");
            eprintln!(
                "error: Azure OpenAI endpoint and API key required. Set via: config or the AZURE_OPENAI_API_KEY env var"
            );
            e
        })?;
        Arc::new(p)
    };

    // Build the capability plugin registry.
    let registry = Arc::new(build_registry(&config)?);

    // Session buffer shared by both conversation modes.
    let buffer = Arc::new(BufferMemory::new());

    // Load the behavioral policy prompt.
    let policy = load_policy(&config.agent).await;

    let engine = Arc::new(ChatEngine::new(
        Arc::clone(&provider),
        Arc::clone(&store),
        Arc::clone(&registry),
        Arc::clone(&buffer),
        config.openai.primary_deployment.clone(),
        policy.clone(),
    ));
    let buffered = Arc::new(BufferedChatEngine::new(
        Arc::clone(&provider),
        Arc::clone(&registry),
        Arc::clone(&buffer),
        config.openai.buffered_deployment.clone(),
        policy,
    ));

    // Install signal handler.
    let cancel = shutdown::install_signal_handler();

    if config.gateway.enabled {
        if config.gateway.bearer_token.is_none() {
            warn!("gateway starting without bearer auth, only sensible behind a trusted proxy");
        }

        let state = AppState {
            engine,
            buffered,
            buffer,
            store: Arc::clone(&store),
            auth: AuthConfig {
                bearer_token: config.gateway.bearer_token.clone(),
            },
            max_messages_per_thread: config.agent.max_messages_per_thread,
        };
        let server_config = ServerConfig {
            host: config.gateway.host.clone(),
            port: config.gateway.port,
            bearer_token: config.gateway.bearer_token.clone(),
        };
        let gateway = Gateway::start(&server_config, state, cancel.clone()).await?;
        info!(
            host = config.gateway.host.as_str(),
            port = config.gateway.port,
            "gateway started"
        );

        cancel.cancelled().await;
        gateway.stopped().await;
    } else {
        warn!("gateway disabled by configuration, nothing to serve");
        cancel.cancelled().await;
    }

    store.close().await?;

    info!("kantoro serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    // One directive per workspace crate; everything else stays at warn.
    let directives = [
        "kantoro",
        "kantoro_chat",
        "kantoro_gateway",
        "kantoro_memory",
        "kantoro_openai",
        "kantoro_plugin",
        "kantoro_storage",
    ]
    .map(|krate| format!("{krate}={log_level}"))
    .join(",");

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{directives},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
