// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `kantoro chat` command implementation.
//!
//! Answers a single message from the command line, streaming the reply to
//! stdout. Runs the same cycle the gateway runs, with the terminal as the
//! output sink, so function calls and metadata tags behave identically.

use std::sync::Arc;

use clap::Args;

use kantoro_chat::{load_policy, ChatEngine, ChatTurn, StdoutSink};
use kantoro_config::model::KantoroConfig;
use kantoro_core::{ChatMessage, ChatProvider, KantoroError};
use kantoro_memory::BufferMemory;
use kantoro_openai::OpenAiProvider;
use kantoro_storage::ConversationStore;

/// Arguments for the one-shot chat command.
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// The message to answer.
    pub message: String,

    /// Reuse an existing thread instead of creating one.
    #[arg(long)]
    pub thread: Option<String>,

    /// Restrict the function catalog to one plugin scope (new threads only).
    #[arg(long)]
    pub plugin: Option<String>,

    /// Sender display name recorded on the thread.
    #[arg(long, default_value = "Local User")]
    pub sender_name: String,

    /// Sender email recorded on the thread.
    #[arg(long, default_value = "local@kantoro")]
    pub sender_email: String,
}

/// Runs the `kantoro chat` command.
pub async fn run_chat(config: KantoroConfig, args: ChatArgs) -> Result<(), KantoroError> {
    // Open the conversation store (runs migrations).
    let store = Arc::new(ConversationStore::open(&config.storage).await?);

    // Initialize the Azure OpenAI provider.
    let provider: Arc<dyn ChatProvider> =
        Arc::new(OpenAiProvider::new(&config.openai).inspect_err(|_| {
            eprintln!(
                "error: Azure OpenAI endpoint and API key required. Set via: config or the AZURE_OPENAI_API_KEY env var"
            );
        })?);

    let registry = Arc::new(crate::serve::build_registry(&config)?);
    let policy = load_policy(&config.agent).await;
    let engine = ChatEngine::new(
        provider,
        Arc::clone(&store),
        registry,
        Arc::new(BufferMemory::new()),
        config.openai.primary_deployment.clone(),
        policy,
    );

    // Find or create the thread the message lands on. An existing thread's
    // own plugin column keeps governing its catalog.
    let thread = match args.thread {
        Some(ref id) => store
            .find_thread(id)
            .await?
            .ok_or_else(|| KantoroError::Internal(format!("no such thread: {id}")))?,
        None => {
            store
                .create_thread(&args.sender_email, None, args.plugin.clone())
                .await?
        }
    };

    let user_message = store
        .append(&thread.id, &ChatMessage::user(args.message.clone()))
        .await?;
    let turn = ChatTurn {
        sender_name: args.sender_name.clone(),
        sender_email: args.sender_email.clone(),
        thread_id: thread.id.clone(),
        plugin_scope: thread.plugin.clone(),
    };

    let mut sink = StdoutSink;
    engine.respond_stream(&turn, &user_message, &mut sink).await?;

    store.close().await?;
    Ok(())
}
