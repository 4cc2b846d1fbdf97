//! Per-connection live event stream.
//!
//! Each iteration emits an unread snapshot across all platforms, any audit
//! records appended since the previous iteration, and a heartbeat, then
//! sleeps. The audit cursor starts at the latest record when the stream is
//! first polled, so a client sees each later record exactly once. Dropping
//! the stream ends the loop, and so does the shutdown signal, which is
//! checked while blocked on the audit log and during the sleep.

use crate::audit::{AuditRecord, Cursor};
use crate::config::Config;
use crate::models::Caller;
use crate::service::GatewayService;
use futures::Stream;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

const SNAPSHOT_LIMIT: u32 = 5;
const AUDIT_BATCH: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    UnreadSnapshot(Value),
    ToolCall(AuditRecord),
    Heartbeat,
    /// The unread snapshot failed; the loop keeps running.
    Error(String),
}

impl StreamEvent {
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::UnreadSnapshot(_) => "unread_snapshot",
            StreamEvent::ToolCall(_) => "tool_call",
            StreamEvent::Heartbeat => "heartbeat",
            StreamEvent::Error(_) => "error",
        }
    }

    pub fn data(&self) -> Value {
        match self {
            StreamEvent::UnreadSnapshot(snapshot) => snapshot.clone(),
            StreamEvent::ToolCall(record) => json!(record),
            StreamEvent::Heartbeat => json!({}),
            StreamEvent::Error(detail) => json!({ "error": detail }),
        }
    }

    /// Audit record id, used as the SSE event id.
    pub fn id(&self) -> Option<String> {
        match self {
            StreamEvent::ToolCall(record) => Some(record.id.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StreamSettings {
    pub snapshot_limit: u32,
    pub audit_batch: usize,
    pub audit_block: Duration,
    pub interval: Duration,
}

impl StreamSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            snapshot_limit: SNAPSHOT_LIMIT,
            audit_batch: AUDIT_BATCH,
            audit_block: config.audit_block(),
            interval: config.heartbeat_interval(),
        }
    }
}

/// Logs when the owning stream is dropped.
struct ConnectionGuard {
    stream_id: Uuid,
    user_id: String,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        tracing::info!(stream_id = %self.stream_id, user_id = %self.user_id, "Event stream closed");
    }
}

async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        // Sender dropped without a shutdown: never fires.
        std::future::pending::<()>().await;
    }
}

pub fn event_stream(
    service: GatewayService,
    caller: Caller,
    settings: StreamSettings,
    mut shutdown: watch::Receiver<bool>,
) -> impl Stream<Item = StreamEvent> {
    async_stream::stream! {
        let guard = ConnectionGuard {
            stream_id: Uuid::new_v4(),
            user_id: caller.user_id().to_string(),
        };
        let audit = service.audit().clone();
        let mut cursor = Cursor::After(audit.latest_id());
        tracing::info!(
            stream_id = %guard.stream_id,
            user_id = %guard.user_id,
            ?cursor,
            "Event stream opened"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            match service.unread_snapshot(&caller, settings.snapshot_limit).await {
                Ok(messages) => yield StreamEvent::UnreadSnapshot(json!({ "messages": messages })),
                Err(err) => {
                    tracing::warn!(stream_id = %guard.stream_id, error = %err, "Unread snapshot failed");
                    yield StreamEvent::Error(err.to_string());
                }
            }

            let batch = tokio::select! {
                batch = audit.read(cursor, settings.audit_batch, settings.audit_block) => batch,
                _ = stop_requested(&mut shutdown) => break,
            };
            cursor = batch.cursor;
            for record in batch.records {
                yield StreamEvent::ToolCall(record);
            }

            yield StreamEvent::Heartbeat;
            tokio::select! {
                _ = tokio::time::sleep(settings.interval) => {}
                _ = stop_requested(&mut shutdown) => break,
            }
        }
        tracing::info!(stream_id = %guard.stream_id, "Event stream ended by shutdown");
    }
}
