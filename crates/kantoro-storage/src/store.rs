// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! High-level conversation store over the typed query modules.

use tracing::debug;

use kantoro_config::model::StorageConfig;
use kantoro_core::types::ChatMessage;
use kantoro_core::KantoroError;

use crate::database::Database;
use crate::models::{StoredMessage, Thread};
use crate::queries;

/// Durable conversation storage.
///
/// Wraps the single [`Database`] handle and delegates to the typed query
/// modules. One instance is shared across the whole process; cloning is
/// not needed because callers hold it behind `Arc`.
pub struct ConversationStore {
    db: Database,
}

impl ConversationStore {
    /// Open the store at the configured database path.
    pub async fn open(config: &StorageConfig) -> Result<Self, KantoroError> {
        let db = Database::open_with(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, "conversation store opened");
        Ok(Self { db })
    }

    /// Wrap an already-open database. Used by tests.
    pub fn with_database(db: Database) -> Self {
        Self { db }
    }

    // --- Thread operations ---

    /// Create a thread owned by `user_email`.
    pub async fn create_thread(
        &self,
        user_email: &str,
        title: Option<String>,
        plugin: Option<String>,
    ) -> Result<Thread, KantoroError> {
        let thread = Thread::new(user_email, title, plugin);
        queries::threads::create_thread(&self.db, &thread).await?;
        debug!(thread_id = %thread.id, user = %user_email, "thread created");
        Ok(thread)
    }

    /// Look up a live thread by id.
    pub async fn find_thread(&self, id: &str) -> Result<Option<Thread>, KantoroError> {
        queries::threads::get_thread(&self.db, id).await
    }

    /// List a user's live threads, newest first.
    pub async fn list_threads(&self, user_email: &str) -> Result<Vec<Thread>, KantoroError> {
        queries::threads::list_threads(&self.db, user_email).await
    }

    /// Soft-delete a thread. Its messages are retained but unreachable
    /// through thread reads.
    pub async fn delete_thread(&self, id: &str) -> Result<bool, KantoroError> {
        let deleted = queries::threads::soft_delete_thread(&self.db, id).await?;
        if deleted {
            debug!(thread_id = %id, "thread soft-deleted");
        }
        Ok(deleted)
    }

    // --- Message operations ---

    /// Append a message, returning the stored row with id and timestamp.
    pub async fn append(
        &self,
        thread_id: &str,
        message: &ChatMessage,
    ) -> Result<StoredMessage, KantoroError> {
        queries::messages::append_message(&self.db, thread_id, message).await
    }

    /// Every message of the thread, all roles, in arrival order.
    pub async fn find_all(&self, thread_id: &str) -> Result<Vec<StoredMessage>, KantoroError> {
        queries::messages::find_all_messages(&self.db, thread_id).await
    }

    /// Only the chat-visible messages: user/assistant with non-empty content.
    pub async fn find_chat_only(
        &self,
        thread_id: &str,
    ) -> Result<Vec<StoredMessage>, KantoroError> {
        queries::messages::find_chat_messages(&self.db, thread_id).await
    }

    /// Number of user-authored messages in the thread.
    pub async fn count_user_messages(&self, thread_id: &str) -> Result<i64, KantoroError> {
        queries::messages::count_user_messages(&self.db, thread_id).await
    }

    /// Checkpoint the WAL ahead of shutdown.
    pub async fn close(&self) -> Result<(), KantoroError> {
        self.db.close().await
    }
}
