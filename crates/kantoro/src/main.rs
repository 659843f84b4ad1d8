// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Kantoro - an AI office-assistant chat backend.
//!
//! This is the binary entry point for the Kantoro server.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod chat;
mod config;
mod serve;
mod shutdown;

/// Kantoro - an AI office-assistant chat backend.
#[derive(Parser, Debug)]
#[command(name = "kantoro", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Kantoro chat server.
    Serve,
    /// Answer a single message from the command line.
    Chat(chat::ChatArgs),
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match kantoro_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            kantoro_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Chat(args)) => chat::run_chat(config, args).await,
        Some(Commands::Config) => config::run_config(&config),
        None => {
            println!("kantoro: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
