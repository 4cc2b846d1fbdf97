//! Adapter backed by a platform service speaking the `/v1` messages API.

use super::{AdapterResult, PlatformAdapter};
use crate::error::AdapterError;
use crate::models::{Message, Platform, PlatformStatus, SendMessageRequest, ThreadDetail};
use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Deserialize)]
struct MessagesEnvelope {
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct ThreadEnvelope {
    thread: ThreadDetail,
}

#[derive(Deserialize)]
struct PlatformsEnvelope {
    platforms: Vec<PlatformStatus>,
}

/// Forwards every call to a back-end over HTTP with the caller's bearer token.
#[derive(Debug, Clone)]
pub struct HttpBackendAdapter {
    platform: Platform,
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackendAdapter {
    /// `client` is shared across adapters; it carries the upstream timeout.
    pub fn new(platform: Platform, client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            platform,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        token: &str,
        query: Option<&[(&str, String)]>,
        body: Option<Value>,
    ) -> AdapterResult<T> {
        let url = self.endpoint(segments)?;
        let path = url.path().to_string();
        let mut builder = self.client.request(method.clone(), url).bearer_auth(token);
        if let Some(query) = query {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder.send().await.map_err(|e| self.transport(e))?;
        let status = response.status();
        tracing::debug!(
            platform = %self.platform,
            method = %method,
            path = %path,
            status = status.as_u16(),
            "Back-end response received"
        );

        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(AdapterError::Upstream {
                platform: self.platform,
                status: status.as_u16(),
                detail: upstream_detail(&raw),
            });
        }

        response.json::<T>().await.map_err(|e| AdapterError::Upstream {
            platform: self.platform,
            status: status.as_u16(),
            detail: format!("Malformed back-end response: {}", e),
        })
    }

    /// Base URL extended with `segments`, each percent-encoded as a single path segment.
    fn endpoint(&self, segments: &[&str]) -> AdapterResult<Url> {
        let invalid = |detail: String| AdapterError::Transport {
            platform: self.platform,
            detail,
        };
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| invalid(format!("Invalid back-end URL '{}': {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| invalid(format!("Back-end URL '{}' cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn transport(&self, err: reqwest::Error) -> AdapterError {
        AdapterError::Transport {
            platform: self.platform,
            detail: err.to_string(),
        }
    }
}

/// Pull the `detail` field out of an error body, falling back to the raw text.
fn upstream_detail(raw: &str) -> String {
    serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|body| match body.get("detail") {
            Some(Value::String(detail)) => Some(detail.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        })
        .unwrap_or_else(|| raw.to_string())
}

#[async_trait]
impl PlatformAdapter for HttpBackendAdapter {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn get_unread_messages(&self, token: &str, limit: u32) -> AdapterResult<Vec<Message>> {
        let envelope: MessagesEnvelope = self
            .request(
                Method::GET,
                &["v1", "messages", "unread"],
                token,
                Some(&[("limit", limit.to_string())]),
                None,
            )
            .await?;
        Ok(envelope.messages)
    }

    async fn send_reply(
        &self,
        token: &str,
        message_id: &str,
        content: &str,
    ) -> AdapterResult<Message> {
        self.request(
            Method::POST,
            &["v1", "messages", message_id, "reply"],
            token,
            None,
            Some(json!({ "body": content })),
        )
        .await
    }

    async fn send_message(
        &self,
        token: &str,
        payload: &SendMessageRequest,
    ) -> AdapterResult<Message> {
        let body = serde_json::to_value(payload).map_err(|e| AdapterError::Transport {
            platform: self.platform,
            detail: format!("Failed to encode payload: {}", e),
        })?;
        self.request(Method::POST, &["v1", "messages", "send"], token, None, Some(body))
            .await
    }

    async fn mark_as_read(&self, token: &str, message_id: &str) -> AdapterResult<Message> {
        self.request(
            Method::POST,
            &["v1", "messages", message_id, "mark-read"],
            token,
            None,
            None,
        )
        .await
    }

    async fn get_platforms(&self, token: &str) -> AdapterResult<Vec<PlatformStatus>> {
        let envelope: PlatformsEnvelope = self
            .request(Method::GET, &["v1", "platforms"], token, None, None)
            .await?;
        Ok(envelope.platforms)
    }

    async fn get_thread(&self, token: &str, thread_id: &str) -> AdapterResult<ThreadDetail> {
        let envelope: ThreadEnvelope = self
            .request(
                Method::GET,
                &["v1", "threads", thread_id],
                token,
                None,
                None,
            )
            .await?;
        Ok(envelope.thread)
    }
}
