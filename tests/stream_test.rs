//! Event stream behavior against the in-memory audit log.

use async_trait::async_trait;
use futures::StreamExt;
use inbox_gateway::{
    adapters::{AdapterResult, StubAdapter},
    audit::{AuditLog, CallStatus},
    models::{
        AuthenticatedUser, Caller, Message, Platform, PlatformStatus, Role, SendMessageRequest,
        ThreadDetail,
    },
    streamer::{event_stream, StreamEvent, StreamSettings},
    AdapterRegistry, GatewayService, PlatformAdapter,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Email adapter that only counts unread fetches.
struct CountingAdapter {
    unread_calls: Arc<AtomicUsize>,
}

#[async_trait]
impl PlatformAdapter for CountingAdapter {
    fn platform(&self) -> Platform {
        Platform::Email
    }

    async fn get_unread_messages(&self, _token: &str, _limit: u32) -> AdapterResult<Vec<Message>> {
        self.unread_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn send_reply(&self, token: &str, _id: &str, _content: &str) -> AdapterResult<Message> {
        StubAdapter::new(Platform::Email).send_reply(token, "", "").await
    }

    async fn send_message(
        &self,
        token: &str,
        payload: &SendMessageRequest,
    ) -> AdapterResult<Message> {
        StubAdapter::new(Platform::Email).send_message(token, payload).await
    }

    async fn mark_as_read(&self, token: &str, id: &str) -> AdapterResult<Message> {
        StubAdapter::new(Platform::Email).mark_as_read(token, id).await
    }

    async fn get_platforms(&self, token: &str) -> AdapterResult<Vec<PlatformStatus>> {
        StubAdapter::new(Platform::Email).get_platforms(token).await
    }

    async fn get_thread(&self, token: &str, id: &str) -> AdapterResult<ThreadDetail> {
        StubAdapter::new(Platform::Email).get_thread(token, id).await
    }
}

fn caller() -> Caller {
    Caller {
        token: "tok".to_string(),
        user: AuthenticatedUser {
            user_id: "u-1".to_string(),
            email: "owner@example.com".to_string(),
            role: Role::Owner,
        },
    }
}

fn service() -> GatewayService {
    let adapters: Vec<Arc<dyn PlatformAdapter>> = Platform::ALL
        .into_iter()
        .map(|p| -> Arc<dyn PlatformAdapter> { Arc::new(StubAdapter::new(p)) })
        .collect();
    GatewayService::new(
        Arc::new(AdapterRegistry::new(adapters)),
        Arc::new(AuditLog::new(100)),
    )
}

fn fast_settings() -> StreamSettings {
    StreamSettings {
        snapshot_limit: 5,
        audit_batch: 10,
        audit_block: Duration::from_millis(20),
        interval: Duration::from_millis(10),
    }
}

/// Pull events until `count` heartbeats have been seen.
async fn until_heartbeats<S>(stream: &mut S, count: usize) -> Vec<StreamEvent>
where
    S: futures::Stream<Item = StreamEvent> + Unpin,
{
    let mut events = Vec::new();
    let mut seen = 0;
    while seen < count {
        let event = tokio::time::timeout(Duration::from_secs(2), stream.next())
            .await
            .expect("stream stalled")
            .expect("stream ended");
        if event == StreamEvent::Heartbeat {
            seen += 1;
        }
        events.push(event);
    }
    events
}

fn tool_call_ids(events: &[StreamEvent]) -> Vec<u64> {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::ToolCall(record) => Some(record.id),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_iteration_emits_snapshot_then_heartbeat() {
    let service = service();
    let (_stop, shutdown) = watch::channel(false);
    let mut stream = Box::pin(event_stream(service, caller(), fast_settings(), shutdown));

    let events = until_heartbeats(&mut stream, 1).await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].name(), "unread_snapshot");
    assert_eq!(events[0].data()["messages"], serde_json::json!([]));
    assert_eq!(events[1].name(), "heartbeat");
}

#[tokio::test]
async fn test_tool_calls_are_delivered_once_in_order() {
    let service = service();
    let audit = service.audit().clone();
    // Appended before the stream starts: never delivered.
    audit.append("get_platforms", "u-1", CallStatus::Success);

    let (_stop, shutdown) = watch::channel(false);
    let mut stream = Box::pin(event_stream(service, caller(), fast_settings(), shutdown));
    let first = until_heartbeats(&mut stream, 1).await;
    assert!(tool_call_ids(&first).is_empty());

    let a = audit.append("send_reply", "u-1", CallStatus::Success);
    let b = audit.append("mark_as_read", "u-2", CallStatus::Failed);
    let second = until_heartbeats(&mut stream, 2).await;

    let c = audit.append("search_messages", "u-1", CallStatus::NotImplemented);
    let third = until_heartbeats(&mut stream, 2).await;

    let mut ids = tool_call_ids(&second);
    ids.extend(tool_call_ids(&third));
    assert_eq!(ids, vec![a, b, c]);

    let unique: HashSet<u64> = ids.iter().copied().collect();
    assert_eq!(unique.len(), ids.len());
}

#[tokio::test]
async fn test_tool_call_event_carries_record_id() {
    let service = service();
    let audit = service.audit().clone();
    let (_stop, shutdown) = watch::channel(false);
    let mut stream = Box::pin(event_stream(service, caller(), fast_settings(), shutdown));
    until_heartbeats(&mut stream, 1).await;

    let id = audit.append("send_message", "u-1", CallStatus::Failed);
    let events = until_heartbeats(&mut stream, 1).await;
    let event = events
        .iter()
        .find(|e| e.name() == "tool_call")
        .expect("tool_call event");

    assert_eq!(event.id(), Some(id.to_string()));
    assert_eq!(event.data()["tool_name"], "send_message");
    assert_eq!(event.data()["status"], "failed");
}

#[tokio::test]
async fn test_dropped_stream_stops_polling_adapters() {
    let unread_calls = Arc::new(AtomicUsize::new(0));
    let adapters: Vec<Arc<dyn PlatformAdapter>> = vec![Arc::new(CountingAdapter {
        unread_calls: Arc::clone(&unread_calls),
    })];
    let service = GatewayService::new(
        Arc::new(AdapterRegistry::new(adapters)),
        Arc::new(AuditLog::new(100)),
    );
    let settings = StreamSettings {
        audit_block: Duration::from_millis(200),
        ..fast_settings()
    };

    let (_stop, shutdown) = watch::channel(false);
    let mut stream = Box::pin(event_stream(service, caller(), settings, shutdown));
    until_heartbeats(&mut stream, 2).await;
    assert_eq!(unread_calls.load(Ordering::SeqCst), 2);

    // Third snapshot is taken, then the loop parks in the blocking audit read.
    let next = stream.next().await;
    assert_eq!(next.map(|e| e.name()), Some("unread_snapshot"));
    let pending = tokio::time::timeout(Duration::from_millis(20), stream.next()).await;
    assert!(pending.is_err());
    drop(stream);

    let seen = unread_calls.load(Ordering::SeqCst);
    assert_eq!(seen, 3);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(unread_calls.load(Ordering::SeqCst), seen);
}

#[tokio::test]
async fn test_shutdown_ends_a_blocked_stream() {
    let service = service();
    let settings = StreamSettings {
        audit_block: Duration::from_secs(30),
        interval: Duration::from_secs(30),
        ..fast_settings()
    };
    let (stop, shutdown) = watch::channel(false);
    let mut stream = Box::pin(event_stream(service, caller(), settings, shutdown));

    let first = stream.next().await;
    assert_eq!(first.map(|e| e.name()), Some("unread_snapshot"));

    stop.send_replace(true);
    let end = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .expect("stream ignored shutdown");
    assert!(end.is_none());
}
