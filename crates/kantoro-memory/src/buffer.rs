// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expiring per-user message buffer.
//!
//! The buffer is the non-durable history store for buffered conversations:
//! one entry per user email, capped at [`MAX_BUFFERED_USER_MESSAGES`]
//! user-authored messages, evicted wholesale on cap overflow or after
//! [`BUFFER_TTL`] without a read or write. Expiry is deadline-based and
//! checked lazily on access; no timers are armed, so looking up an absent
//! key allocates nothing.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use kantoro_core::types::{ChatMessage, Role};

/// How long an entry survives without being read or written.
pub const BUFFER_TTL: Duration = Duration::from_secs(10 * 60 * 60);

/// User-authored messages allowed per entry before the whole entry is dropped.
pub const MAX_BUFFERED_USER_MESSAGES: usize = 10;

struct BufferEntry {
    messages: Vec<ChatMessage>,
    deadline: Instant,
}

impl BufferEntry {
    fn expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    fn user_message_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == Role::User)
            .count()
    }
}

/// In-memory message cache keyed by user email.
pub struct BufferMemory {
    entries: RwLock<HashMap<String, BufferEntry>>,
    ttl: Duration,
    capacity: usize,
}

impl Default for BufferMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferMemory {
    pub fn new() -> Self {
        Self::with_limits(BUFFER_TTL, MAX_BUFFERED_USER_MESSAGES)
    }

    /// Construct with explicit expiry and cap. Used by tests.
    pub fn with_limits(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            capacity,
        }
    }

    /// The buffered messages for `user`, oldest first.
    ///
    /// A read counts as activity and pushes the expiry deadline out. An
    /// absent or expired entry yields the empty list; absent keys stay
    /// absent.
    pub async fn messages(&self, user: &str) -> Vec<ChatMessage> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        match entries.get_mut(user) {
            Some(entry) if entry.expired(now) => {
                entries.remove(user);
                debug!(user, "buffer entry expired");
                Vec::new()
            }
            Some(entry) => {
                entry.deadline = now + self.ttl;
                entry.messages.clone()
            }
            None => Vec::new(),
        }
    }

    /// Append messages to the user's entry, creating it when missing, and
    /// reset the expiry deadline.
    pub async fn add_messages(&self, user: &str, messages: &[ChatMessage]) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(user.to_string())
            .and_modify(|e| {
                if e.expired(now) {
                    e.messages.clear();
                }
            })
            .or_insert_with(|| BufferEntry {
                messages: Vec::new(),
                deadline: now + self.ttl,
            });
        entry.messages.extend_from_slice(messages);
        entry.deadline = now + self.ttl;
    }

    /// Drop the user's entry when it has reached the user-message cap.
    ///
    /// The whole entry goes, never a prefix: the next turn starts from an
    /// empty history. Returns whether an eviction happened.
    pub async fn clear_if_full(&self, user: &str) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        match entries.get(user) {
            Some(entry) if entry.expired(now) => {
                entries.remove(user);
                false
            }
            Some(entry) if entry.user_message_count() >= self.capacity => {
                entries.remove(user);
                debug!(user, "buffer entry evicted at message cap");
                true
            }
            _ => false,
        }
    }

    /// Number of user-authored messages in the user's entry.
    ///
    /// A pure read: it neither extends the deadline nor evicts. An absent
    /// or expired entry counts as zero.
    pub async fn user_message_count(&self, user: &str) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        match entries.get(user) {
            Some(entry) if !entry.expired(now) => entry.user_message_count(),
            _ => 0,
        }
    }

    /// Delete the user's entry. Returns whether one existed.
    pub async fn clear(&self, user: &str) -> bool {
        let existed = self.entries.write().await.remove(user).is_some();
        if existed {
            debug!(user, "buffer entry cleared");
        }
        existed
    }
}
