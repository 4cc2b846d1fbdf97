//! REST mirrors of the gateway tools.
//!
//! Each route requires a bearer token and returns the same payload the
//! matching JSON-RPC tool returns, with failures mapped to HTTP statuses.

use crate::error::{AppError, Result};
use crate::models::{
    Caller, Message, Platform, PlatformStatus, PlatformTarget, SendMessageRequest, ThreadDetail,
};
use crate::rpc::tools::{
    parse_platform, parse_target, validate_limit, validate_text, DEFAULT_UNREAD_LIMIT,
};
use crate::service::{PrioritizedMessages, SearchResults, ThreadSummary};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

fn default_all() -> String {
    "all".to_string()
}

fn default_email() -> String {
    "email".to_string()
}

fn default_criteria() -> String {
    "urgency".to_string()
}

fn default_limit() -> i64 {
    DEFAULT_UNREAD_LIMIT
}

#[derive(Debug, Deserialize)]
pub struct UnreadQuery {
    #[serde(default = "default_all")]
    pub platform: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize)]
pub struct PlatformQuery {
    #[serde(default = "default_email")]
    pub platform: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default = "default_all")]
    pub platform: String,
}

#[derive(Debug, Deserialize)]
pub struct SendReplyBody {
    #[serde(default = "default_email")]
    pub platform: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageBody {
    #[serde(default = "default_email")]
    pub platform: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub recipients: Vec<String>,
    pub body: String,
    #[serde(default)]
    pub thread_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MarkReadBody {
    #[serde(default = "default_email")]
    pub platform: String,
    pub message_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PrioritizeBody {
    pub messages: Vec<Value>,
    #[serde(default = "default_criteria")]
    pub criteria: String,
}

#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: Message,
}

#[derive(Debug, Serialize)]
pub struct ThreadResponse {
    pub thread: ThreadDetail,
}

#[derive(Debug, Serialize)]
pub struct PlatformsResponse {
    pub platforms: Vec<PlatformStatus>,
}

/// GET /messages/unread
pub async fn get_unread_messages(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(query): Query<UnreadQuery>,
) -> Result<Json<MessageListResponse>> {
    let target = parse_target(&query.platform)?;
    let limit = validate_limit(query.limit)?;
    let messages = state
        .service
        .get_unread_messages(&caller, target, limit)
        .await?;
    Ok(Json(MessageListResponse { messages }))
}

/// GET /v1/inbox/unread - legacy alias, always every platform.
pub async fn get_unread_messages_v1(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(query): Query<LimitQuery>,
) -> Result<Json<MessageListResponse>> {
    let limit = validate_limit(query.limit)?;
    let messages = state
        .service
        .get_unread_messages(&caller, PlatformTarget::All, limit)
        .await?;
    Ok(Json(MessageListResponse { messages }))
}

/// POST /messages/:message_id/reply
pub async fn send_reply(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(message_id): Path<String>,
    Json(body): Json<SendReplyBody>,
) -> Result<Json<MessageResponse>> {
    let platform = parse_platform(&body.platform)?;
    validate_text("content", &body.content)?;
    let message = state
        .service
        .send_reply(&caller, platform, &message_id, &body.content)
        .await?;
    Ok(Json(MessageResponse { message }))
}

/// POST /messages/send
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(body): Json<SendMessageBody>,
) -> Result<Json<MessageResponse>> {
    let platform = parse_platform(&body.platform)?;
    validate_text("body", &body.body)?;
    let payload = SendMessageRequest {
        platform,
        subject: body.subject,
        recipients: body.recipients,
        body: body.body,
        thread_id: body.thread_id,
    };
    let message = state.service.send_message(&caller, &payload).await?;
    Ok(Json(MessageResponse { message }))
}

/// PATCH /messages/read
pub async fn mark_as_read(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(body): Json<MarkReadBody>,
) -> Result<Json<MessageListResponse>> {
    let platform = parse_platform(&body.platform)?;
    if body.message_ids.is_empty() {
        return Err(AppError::InvalidArgument(
            "message_ids must not be empty".to_string(),
        ));
    }
    let messages = state
        .service
        .mark_as_read(&caller, platform, &body.message_ids)
        .await?;
    Ok(Json(MessageListResponse { messages }))
}

/// POST /messages/prioritize
pub async fn prioritize_messages(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(body): Json<PrioritizeBody>,
) -> Json<PrioritizedMessages> {
    let messages = body.messages.into_iter().filter(Value::is_object).collect();
    Json(
        state
            .service
            .prioritize_messages(&caller, messages, body.criteria),
    )
}

/// GET /threads/:thread_id
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(thread_id): Path<String>,
    Query(query): Query<PlatformQuery>,
) -> Result<Json<ThreadResponse>> {
    let platform = parse_platform(&query.platform)?;
    let thread = state
        .service
        .get_thread(&caller, platform, &thread_id)
        .await?;
    Ok(Json(ThreadResponse { thread }))
}

/// GET /v1/threads/:thread_id - legacy alias, always email.
pub async fn get_thread_v1(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(thread_id): Path<String>,
) -> Result<Json<ThreadResponse>> {
    let thread = state
        .service
        .get_thread(&caller, Platform::Email, &thread_id)
        .await?;
    Ok(Json(ThreadResponse { thread }))
}

/// GET /threads/:thread_id/summary
pub async fn summarize_thread(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(thread_id): Path<String>,
    Query(query): Query<PlatformQuery>,
) -> Json<ThreadSummary> {
    Json(
        state
            .service
            .summarize_threads(&caller, query.platform, Some(thread_id)),
    )
}

/// GET /messages/search?q=
pub async fn search_messages(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(query): Query<SearchQuery>,
) -> Json<SearchResults> {
    Json(
        state
            .service
            .search_messages(&caller, query.platform, query.q),
    )
}

/// GET /platforms
pub async fn get_platforms(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<PlatformsResponse>> {
    let platforms = state.service.get_platforms(&caller).await?;
    Ok(Json(PlatformsResponse { platforms }))
}
