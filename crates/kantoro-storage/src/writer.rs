// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Write-path invariant: one connection, one writer.
//!
//! Every statement that touches `threads` or `messages` goes through the
//! single `tokio_rusqlite::Connection` held by [`crate::Database`], whose
//! background thread runs closures strictly in submission order. That
//! ordering is what makes message ids monotone per thread and keeps
//! concurrent appends from ever hitting SQLITE_BUSY.
//!
//! **Do NOT open a second `Connection` to the same file for writes.**

// Enforced structurally rather than by a lock:
// - `Database` owns the only `tokio_rusqlite::Connection` in the process
// - query modules take `&Database` and go through `database.connection().call()`
// - reads share the same thread, so a read after a write observes it
