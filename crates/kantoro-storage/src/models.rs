// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for storage entities.
//!
//! Serde shapes here are the API shapes: camelCase keys, optional fields
//! omitted when absent. The gateway serializes these rows directly.

use serde::{Deserialize, Serialize};

use kantoro_core::types::{ChatMessage, FunctionCall, Role};

/// A conversation thread row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: String,
    /// Email of the owning user. Exactly one owner per thread.
    pub user_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// When set, restricts the function catalog to this plugin's scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,
}

impl Thread {
    /// Create a new thread row with a fresh id and current timestamp.
    pub fn new(user_email: &str, title: Option<String>, plugin: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_email: user_email.to_string(),
            title,
            plugin,
            created_at: chrono::Utc::now()
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string(),
            deleted_at: None,
        }
    }
}

/// A persisted message row: a [`ChatMessage`] plus its storage identity.
///
/// The id is assigned by SQLite in arrival order and is the ordering key
/// for the whole thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    pub id: i64,
    pub thread_id: String,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    pub created_at: String,
}

impl StoredMessage {
    /// The provider-facing view of this row, without storage identity.
    pub fn as_chat_message(&self) -> ChatMessage {
        ChatMessage {
            role: self.role,
            content: self.content.clone(),
            name: self.name.clone(),
            function_call: self.function_call.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_new_assigns_id_and_timestamp() {
        let t = Thread::new("alice@example.com", Some("desks".into()), None);
        assert!(!t.id.is_empty());
        assert!(t.created_at.ends_with('Z'));
        assert!(t.deleted_at.is_none());
    }

    #[test]
    fn stored_message_serializes_camel_case() {
        let m = StoredMessage {
            id: 7,
            thread_id: "t-1".into(),
            role: Role::Assistant,
            content: String::new(),
            name: None,
            function_call: Some(FunctionCall {
                name: "Joan-getAvailableDesks".into(),
                arguments: "{}".into(),
            }),
            created_at: "2026-01-01T00:00:00.000Z".into(),
        };
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["threadId"], "t-1");
        assert_eq!(json["functionCall"]["name"], "Joan-getAvailableDesks");
        assert_eq!(json["createdAt"], "2026-01-01T00:00:00.000Z");
        assert!(json.get("name").is_none());
    }

    #[test]
    fn as_chat_message_drops_storage_identity() {
        let m = StoredMessage {
            id: 3,
            thread_id: "t-1".into(),
            role: Role::Function,
            content: "result".into(),
            name: Some("Joan-getAvailableDesks".into()),
            function_call: None,
            created_at: "2026-01-01T00:00:00.000Z".into(),
        };
        let chat = m.as_chat_message();
        assert_eq!(chat.role, Role::Function);
        assert_eq!(chat.name.as_deref(), Some("Joan-getAvailableDesks"));
        assert_eq!(chat.content, "result");
    }
}
