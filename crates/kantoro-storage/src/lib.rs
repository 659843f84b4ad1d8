// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Kantoro chat backend.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and typed CRUD operations for
//! threads and messages.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod store;
pub mod writer;

pub use database::Database;
pub use models::*;
pub use store::ConversationStore;
