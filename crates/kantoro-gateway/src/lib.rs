// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Kantoro chat backend.
//!
//! Exposes the thread API over axum: creating a thread or appending a
//! message runs the chat cycle and streams the tagged output as a chunked
//! text body. Reads and deletes go straight to the conversation store.
//! A separate `/v1/chat` route serves the buffered session variant,
//! which keeps nothing on disk.

pub mod auth;
pub mod handlers;
pub mod server;
pub(crate) mod stream;

use std::net::SocketAddr;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use kantoro_core::KantoroError;

pub use crate::auth::AuthConfig;
pub use crate::server::{AppState, ServerConfig};

/// The gateway server running as a background task.
///
/// Dropping the handle leaves the server running; cancelling the token
/// passed to [`start`](Gateway::start) shuts it down gracefully, and
/// [`stopped`](Gateway::stopped) waits for that to finish.
pub struct Gateway {
    local_addr: SocketAddr,
    handle: tokio::task::JoinHandle<()>,
}

impl Gateway {
    /// Bind the configured address and serve in the background.
    pub async fn start(
        config: &ServerConfig,
        state: AppState,
        shutdown: CancellationToken,
    ) -> Result<Self, KantoroError> {
        let addr = format!("{}:{}", config.host, config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| KantoroError::Channel {
                message: format!("failed to bind gateway to {addr}: {e}"),
                source: Some(Box::new(e)),
            })?;
        let local_addr = listener.local_addr().map_err(|e| KantoroError::Channel {
            message: format!("failed to read gateway listener address: {e}"),
            source: Some(Box::new(e)),
        })?;

        let app = server::router(state);
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await
            {
                error!(error = %e, "gateway server error");
            }
        });

        info!(addr = %local_addr, "gateway listening");
        Ok(Self { local_addr, handle })
    }

    /// The bound address, with the real port when 0 was configured.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for the server task to finish after shutdown was requested.
    pub async fn stopped(self) {
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio_util::sync::CancellationToken;

    use kantoro_chat::{BufferedChatEngine, ChatEngine};
    use kantoro_config::model::StorageConfig;
    use kantoro_core::{ChatMessage, ChatProvider};
    use kantoro_memory::BufferMemory;
    use kantoro_plugin::PluginRegistry;
    use kantoro_storage::ConversationStore;
    use kantoro_test_utils::MockProvider;

    use super::*;

    struct TestGateway {
        base: String,
        provider: Arc<MockProvider>,
        gateway: Gateway,
        shutdown: CancellationToken,
        _dir: tempfile::TempDir,
    }

    async fn spawn_gateway(bearer_token: Option<&str>, max_messages: u32) -> TestGateway {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("gateway.db").to_string_lossy().into_owned(),
            wal_mode: true,
        };
        let store = Arc::new(ConversationStore::open(&config).await.unwrap());
        let provider = Arc::new(MockProvider::new());
        let registry = Arc::new(PluginRegistry::builder().build().unwrap());
        let buffer = Arc::new(BufferMemory::new());
        let engine = Arc::new(ChatEngine::new(
            Arc::clone(&provider) as Arc<dyn ChatProvider>,
            Arc::clone(&store),
            Arc::clone(&registry),
            Arc::clone(&buffer),
            "gpt-4-32k",
            "Answer briefly.",
        ));
        let buffered = Arc::new(BufferedChatEngine::new(
            Arc::clone(&provider) as Arc<dyn ChatProvider>,
            registry,
            Arc::clone(&buffer),
            "gpt-4",
            "Answer briefly.",
        ));

        let state = AppState {
            engine,
            buffered,
            buffer,
            store,
            auth: AuthConfig {
                bearer_token: bearer_token.map(String::from),
            },
            max_messages_per_thread: max_messages,
        };
        let server_config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            bearer_token: bearer_token.map(String::from),
        };
        let shutdown = CancellationToken::new();
        let gateway = Gateway::start(&server_config, state, shutdown.clone())
            .await
            .unwrap();

        TestGateway {
            base: format!("http://{}", gateway.local_addr()),
            provider,
            gateway,
            shutdown,
            _dir: dir,
        }
    }

    fn tag_value(body: &str, tag: &str) -> String {
        let marker = format!("[[{tag}=");
        let start = body.find(&marker).unwrap() + marker.len();
        let end = body[start..].find("]]").unwrap();
        body[start..start + end].to_string()
    }

    #[tokio::test]
    async fn health_is_unauthenticated() {
        let gw = spawn_gateway(Some("sesame"), 0).await;
        let response = reqwest::get(format!("{}/health", gw.base)).await.unwrap();
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn missing_or_bad_token_is_unauthorized() {
        let gw = spawn_gateway(Some("sesame"), 0).await;
        let client = reqwest::Client::new();
        let url = format!("{}/v1/threads?user_email=alice@example.com", gw.base);

        let bare = client.get(&url).send().await.unwrap();
        assert_eq!(bare.status(), 401);

        let wrong = client
            .get(&url)
            .header("authorization", "Bearer open-up")
            .send()
            .await
            .unwrap();
        assert_eq!(wrong.status(), 401);
    }

    #[tokio::test]
    async fn bearer_token_grants_access() {
        let gw = spawn_gateway(Some("sesame"), 0).await;
        let client = reqwest::Client::new();
        let response = client
            .get(format!("{}/v1/threads?user_email=alice@example.com", gw.base))
            .header("authorization", "Bearer sesame")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let threads: Vec<serde_json::Value> = response.json().await.unwrap();
        assert!(threads.is_empty());
    }

    #[tokio::test]
    async fn thread_create_streams_the_tagged_cycle() {
        let gw = spawn_gateway(None, 0).await;
        gw.provider.push(ChatMessage::assistant("Hello Alice!")).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/v1/threads", gw.base))
            .json(&serde_json::json!({
                "title": "Greetings",
                "sender_name": "Alice",
                "sender_email": "alice@example.com",
                "content": "Hi"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert!(response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/plain"));

        let body = response.text().await.unwrap();
        assert!(body.contains("[[role=assistant]]Hello Alice!"));
        assert!(body.contains("[[aiMessageId="));
        let thread_id = tag_value(&body, "threadId");

        let threads: Vec<serde_json::Value> = client
            .get(format!("{}/v1/threads?user_email=alice@example.com", gw.base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0]["id"], thread_id.as_str());
        assert_eq!(threads[0]["title"], "Greetings");

        let messages: Vec<serde_json::Value> = client
            .get(format!("{}/v1/threads/{thread_id}/messages", gw.base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[1]["content"], "Hello Alice!");
    }

    #[tokio::test]
    async fn message_limit_returns_429() {
        let gw = spawn_gateway(None, 1).await;
        let client = reqwest::Client::new();

        let body = client
            .post(format!("{}/v1/threads", gw.base))
            .json(&serde_json::json!({
                "sender_name": "Alice",
                "sender_email": "alice@example.com",
                "content": "Hi"
            }))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        let thread_id = tag_value(&body, "threadId");

        let over = client
            .post(format!("{}/v1/threads/{thread_id}/messages", gw.base))
            .json(&serde_json::json!({
                "sender_name": "Alice",
                "sender_email": "alice@example.com",
                "content": "One more"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(over.status(), 429);
        let error: serde_json::Value = over.json().await.unwrap();
        assert_eq!(error["error"], "You can only send 1 messages to a thread");
    }

    #[tokio::test]
    async fn append_to_missing_thread_is_404() {
        let gw = spawn_gateway(None, 0).await;
        let response = reqwest::Client::new()
            .post(format!("{}/v1/threads/no-such-thread/messages", gw.base))
            .json(&serde_json::json!({
                "sender_name": "Alice",
                "sender_email": "alice@example.com",
                "content": "Hello?"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn delete_thread_removes_it_from_listing() {
        let gw = spawn_gateway(None, 0).await;
        let client = reqwest::Client::new();

        let body = client
            .post(format!("{}/v1/threads", gw.base))
            .json(&serde_json::json!({
                "sender_name": "Alice",
                "sender_email": "alice@example.com",
                "content": "Hi"
            }))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        let thread_id = tag_value(&body, "threadId");

        let deleted = client
            .delete(format!("{}/v1/threads/{thread_id}", gw.base))
            .send()
            .await
            .unwrap();
        assert_eq!(deleted.status(), 204);

        let threads: Vec<serde_json::Value> = client
            .get(format!("{}/v1/threads?user_email=alice@example.com", gw.base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(threads.is_empty());

        let again = client
            .delete(format!("{}/v1/threads/{thread_id}", gw.base))
            .send()
            .await
            .unwrap();
        assert_eq!(again.status(), 404);

        let transcript = client
            .get(format!("{}/v1/threads/{thread_id}/messages", gw.base))
            .send()
            .await
            .unwrap();
        assert_eq!(transcript.status(), 404);
    }

    #[tokio::test]
    async fn provider_failure_maps_to_bad_gateway() {
        let gw = spawn_gateway(None, 0).await;
        gw.provider.push_error("upstream exploded").await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/v1/threads", gw.base))
            .json(&serde_json::json!({
                "sender_name": "Alice",
                "sender_email": "alice@example.com",
                "content": "Hi"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 502);
        let error: serde_json::Value = response.json().await.unwrap();
        assert_eq!(error["error"], "completion provider request failed");

        // The thread and its user message were persisted before the cycle
        // failed; only the assistant reply is missing.
        let threads: Vec<serde_json::Value> = client
            .get(format!("{}/v1/threads?user_email=alice@example.com", gw.base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(threads.len(), 1);
    }

    #[tokio::test]
    async fn buffered_chat_counts_the_session() {
        let gw = spawn_gateway(None, 0).await;
        let client = reqwest::Client::new();

        gw.provider.push(ChatMessage::assistant("First reply")).await;
        let first: serde_json::Value = client
            .post(format!("{}/v1/chat", gw.base))
            .json(&serde_json::json!({
                "sender_name": "Alice",
                "sender_email": "alice@example.com",
                "content": "Hi"
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(first["text"], "First reply\n\n*1* of 10.");

        gw.provider.push(ChatMessage::assistant("Second reply")).await;
        let second: serde_json::Value = client
            .post(format!("{}/v1/chat", gw.base))
            .json(&serde_json::json!({
                "sender_name": "Alice",
                "sender_email": "alice@example.com",
                "content": "And again"
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(second["text"], "Second reply\n\n*2* of 10.");
    }

    #[tokio::test]
    async fn buffered_chat_delete_reports_the_dropped_count() {
        let gw = spawn_gateway(None, 0).await;
        let client = reqwest::Client::new();

        gw.provider.push(ChatMessage::assistant("Reply")).await;
        client
            .post(format!("{}/v1/chat", gw.base))
            .json(&serde_json::json!({
                "sender_name": "Alice",
                "sender_email": "alice@example.com",
                "content": "Hi"
            }))
            .send()
            .await
            .unwrap();

        let deleted = client
            .delete(format!("{}/v1/chat", gw.base))
            .json(&serde_json::json!({ "sender_email": "alice@example.com" }))
            .send()
            .await
            .unwrap();
        assert_eq!(deleted.status(), 200);
        assert_eq!(
            deleted.text().await.unwrap(),
            "Chat deleted, message count 1"
        );

        // The entry is gone, so a second delete counts zero.
        let again = client
            .delete(format!("{}/v1/chat", gw.base))
            .json(&serde_json::json!({ "sender_email": "alice@example.com" }))
            .send()
            .await
            .unwrap();
        assert_eq!(
            again.text().await.unwrap(),
            "Chat deleted, message count 0"
        );
    }

    #[tokio::test]
    async fn graceful_shutdown_stops_the_listener() {
        let gw = spawn_gateway(None, 0).await;
        let health = format!("{}/health", gw.base);
        assert_eq!(reqwest::get(&health).await.unwrap().status(), 200);

        gw.shutdown.cancel();
        gw.gateway.stopped().await;

        assert!(reqwest::get(&health).await.is_err());
    }
}
