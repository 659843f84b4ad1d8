// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message CRUD operations.
//!
//! Messages are append-only. Ids come from SQLite in insertion order and
//! every read here orders by id, so thread order is arrival order.

use kantoro_core::types::{ChatMessage, Role};
use kantoro_core::KantoroError;
use rusqlite::params;

use crate::database::Database;
use crate::models::StoredMessage;

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredMessage> {
    let role_str: String = row.get(2)?;
    let role = role_str.parse::<Role>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let function_call: Option<String> = row.get(5)?;
    let function_call = match function_call {
        Some(raw) => Some(serde_json::from_str(&raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?),
        None => None,
    };
    Ok(StoredMessage {
        id: row.get(0)?,
        thread_id: row.get(1)?,
        role,
        content: row.get(3)?,
        name: row.get(4)?,
        function_call,
        created_at: row.get(6)?,
    })
}

const SELECT_COLUMNS: &str = "id, thread_id, role, content, name, function_call, created_at";

/// Append a message to a thread, returning the stored row with its
/// assigned id and timestamp.
pub async fn append_message(
    db: &Database,
    thread_id: &str,
    message: &ChatMessage,
) -> Result<StoredMessage, KantoroError> {
    let thread_id = thread_id.to_string();
    let message = message.clone();
    db.connection()
        .call(move |conn| {
            let function_call = match &message.function_call {
                Some(fc) => Some(serde_json::to_string(fc).map_err(|e| {
                    rusqlite::Error::ToSqlConversionFailure(Box::new(e))
                })?),
                None => None,
            };
            conn.execute(
                "INSERT INTO messages (thread_id, role, content, name, function_call, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))",
                params![
                    thread_id,
                    message.role.to_string(),
                    message.content,
                    message.name,
                    function_call,
                ],
            )?;
            let id = conn.last_insert_rowid();
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM messages WHERE id = ?1"
            ))?;
            stmt.query_row(params![id], row_to_message)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All messages of a thread in arrival order, every role included.
pub async fn find_all_messages(
    db: &Database,
    thread_id: &str,
) -> Result<Vec<StoredMessage>, KantoroError> {
    let thread_id = thread_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM messages WHERE thread_id = ?1 ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map(params![thread_id], row_to_message)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The chat-visible subset of a thread: user and assistant messages with
/// non-empty content, in arrival order. Function-role messages and the
/// empty-content assistant rows that carry a function call never appear.
pub async fn find_chat_messages(
    db: &Database,
    thread_id: &str,
) -> Result<Vec<StoredMessage>, KantoroError> {
    let thread_id = thread_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM messages
                 WHERE thread_id = ?1 AND role IN ('user', 'assistant') AND content <> ''
                 ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map(params![thread_id], row_to_message)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Number of user-authored messages in a thread.
pub async fn count_user_messages(db: &Database, thread_id: &str) -> Result<i64, KantoroError> {
    let thread_id = thread_id.to_string();
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE thread_id = ?1 AND role = 'user'",
                params![thread_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
