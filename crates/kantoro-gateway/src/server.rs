// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use kantoro_chat::{BufferedChatEngine, ChatEngine};
use kantoro_memory::BufferMemory;
use kantoro_storage::ConversationStore;

use crate::auth::{auth_middleware, AuthConfig};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The chat cycle behind every thread message.
    pub engine: Arc<ChatEngine>,
    /// The buffered variant behind the sessionless chat route.
    pub buffered: Arc<BufferedChatEngine>,
    /// Session buffer shared with the buffered engine.
    pub buffer: Arc<BufferMemory>,
    /// Thread and message storage.
    pub store: Arc<ConversationStore>,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// Maximum user messages per thread. 0 disables the limit.
    pub max_messages_per_thread: u32,
}

/// Gateway server configuration (mirrors `GatewayConfig` from
/// kantoro-config to keep this crate off the config stack).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind. 0 picks a free port.
    pub port: u16,
    /// Bearer token for auth (None = auth disabled).
    pub bearer_token: Option<String>,
}

/// Build the gateway router.
///
/// Routes:
/// - GET /health (unauthenticated)
/// - POST /v1/threads, GET /v1/threads (with auth)
/// - DELETE /v1/threads/{id} (with auth)
/// - GET/POST /v1/threads/{id}/messages (with auth)
/// - POST/DELETE /v1/chat (with auth)
pub fn router(state: AppState) -> Router {
    let auth_state = state.auth.clone();

    // Unauthenticated liveness route for load balancers and systemd.
    let public_routes = Router::new().route("/health", get(handlers::get_health));

    // Routes requiring authentication.
    let api_routes = Router::new()
        .route(
            "/v1/threads",
            post(handlers::create_thread).get(handlers::list_threads),
        )
        .route("/v1/threads/{id}", delete(handlers::delete_thread))
        .route(
            "/v1/threads/{id}/messages",
            get(handlers::get_thread_messages).post(handlers::append_message),
        )
        .route(
            "/v1/chat",
            post(handlers::buffered_chat).delete(handlers::delete_buffered_chat),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(CorsLayer::permissive())
}
