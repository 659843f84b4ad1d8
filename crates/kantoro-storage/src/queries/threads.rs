// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thread CRUD operations.
//!
//! Soft-deleted threads stay in the table; every read here filters them out.

use kantoro_core::KantoroError;
use rusqlite::params;

use crate::database::Database;
use crate::models::Thread;

fn row_to_thread(row: &rusqlite::Row<'_>) -> rusqlite::Result<Thread> {
    Ok(Thread {
        id: row.get(0)?,
        user_email: row.get(1)?,
        title: row.get(2)?,
        plugin: row.get(3)?,
        created_at: row.get(4)?,
        deleted_at: row.get(5)?,
    })
}

/// Insert a new thread.
pub async fn create_thread(db: &Database, thread: &Thread) -> Result<(), KantoroError> {
    let thread = thread.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO threads (id, user_email, title, plugin, created_at, deleted_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    thread.id,
                    thread.user_email,
                    thread.title,
                    thread.plugin,
                    thread.created_at,
                    thread.deleted_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a live thread by id. Soft-deleted threads are not returned.
pub async fn get_thread(db: &Database, id: &str) -> Result<Option<Thread>, KantoroError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_email, title, plugin, created_at, deleted_at
                 FROM threads WHERE id = ?1 AND deleted_at IS NULL",
            )?;
            let result = stmt.query_row(params![id], row_to_thread);
            match result {
                Ok(thread) => Ok(Some(thread)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List a user's live threads, newest first.
pub async fn list_threads(db: &Database, user_email: &str) -> Result<Vec<Thread>, KantoroError> {
    let user_email = user_email.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_email, title, plugin, created_at, deleted_at
                 FROM threads WHERE user_email = ?1 AND deleted_at IS NULL
                 ORDER BY created_at DESC",
            )?;
            let rows = stmt.query_map(params![user_email], row_to_thread)?;
            let mut threads = Vec::new();
            for row in rows {
                threads.push(row?);
            }
            Ok(threads)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Soft-delete a thread. Returns false if it did not exist or was already deleted.
pub async fn soft_delete_thread(db: &Database, id: &str) -> Result<bool, KantoroError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let affected = conn.execute(
                "UPDATE threads SET deleted_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND deleted_at IS NULL",
                params![id],
            )?;
            Ok(affected > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
