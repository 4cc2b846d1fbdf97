pub mod health;
pub mod rest;
pub mod rpc;
pub mod stream;

pub use health::{health_handler, ready_handler};
pub use rpc::rpc_handler;
pub use stream::stream_handler;

use crate::error::AppError;
use crate::models::Caller;
use crate::state::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

/// Authenticated caller extracted from the bearer token; rejects with 401.
#[async_trait]
impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        state.authenticate(&parts.headers).await
    }
}

/// All gateway routes: JSON-RPC, event stream, REST mirrors and probes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Protocol endpoints
        .route("/mcp", post(rpc_handler))
        .route("/mcp/sse", get(stream_handler))
        // REST mirrors
        .route("/messages/unread", get(rest::get_unread_messages))
        .route("/messages/:message_id/reply", post(rest::send_reply))
        .route("/messages/send", post(rest::send_message))
        .route("/messages/read", patch(rest::mark_as_read))
        .route("/messages/prioritize", post(rest::prioritize_messages))
        .route("/messages/search", get(rest::search_messages))
        .route("/threads/:thread_id", get(rest::get_thread))
        .route("/threads/:thread_id/summary", get(rest::summarize_thread))
        .route("/platforms", get(rest::get_platforms))
        // Legacy aliases
        .route("/v1/inbox/unread", get(rest::get_unread_messages_v1))
        .route("/v1/threads/:thread_id", get(rest::get_thread_v1))
        // Health endpoints
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .with_state(state)
}
