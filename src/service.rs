//! Gateway operations shared by the JSON-RPC, REST and streaming surfaces.
//!
//! Every operation that reaches an adapter is recorded in the audit log,
//! whether it succeeds or fails. Validation failures that stop a call before
//! any adapter is involved are not recorded.

use crate::adapters::AdapterRegistry;
use crate::aggregation::{dedup_statuses, fan_out, rank_by_priority};
use crate::audit::{AuditLog, CallStatus};
use crate::error::Result;
use crate::models::{
    Caller, Message, Platform, PlatformStatus, PlatformTarget, SendMessageRequest, ThreadDetail,
};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Serialize)]
pub struct PrioritizedMessages {
    pub criteria: String,
    pub messages: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct ThreadSummary {
    pub phase: u8,
    pub platform: String,
    pub thread_id: Option<String>,
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub phase: u8,
    pub platform: String,
    pub query: String,
    pub result: String,
}

#[derive(Clone)]
pub struct GatewayService {
    registry: Arc<AdapterRegistry>,
    audit: Arc<AuditLog>,
}

impl GatewayService {
    pub fn new(registry: Arc<AdapterRegistry>, audit: Arc<AuditLog>) -> Self {
        Self { registry, audit }
    }

    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    fn record(&self, tool: &'static str, user_id: &str, status: CallStatus) {
        self.audit.append(tool, user_id, status);
        metrics::counter!(
            "gateway_tool_calls_total",
            "tool" => tool,
            "status" => status.as_str()
        )
        .increment(1);
    }

    async fn audited<T, F>(&self, tool: &'static str, caller: &Caller, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let start = Instant::now();
        let result = call.await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => {
                tracing::info!(tool, user_id = caller.user_id(), elapsed_ms, "Tool call succeeded");
                self.record(tool, caller.user_id(), CallStatus::Success);
            }
            Err(err) if err.reached_adapter() => {
                tracing::warn!(
                    tool,
                    user_id = caller.user_id(),
                    elapsed_ms,
                    error = %err,
                    "Tool call failed"
                );
                self.record(tool, caller.user_id(), CallStatus::Failed);
            }
            Err(err) => {
                tracing::debug!(tool, error = %err, "Tool call rejected before execution");
            }
        }
        result
    }

    pub async fn get_unread_messages(
        &self,
        caller: &Caller,
        target: PlatformTarget,
        limit: u32,
    ) -> Result<Vec<Message>> {
        self.audited(
            "get_unread_messages",
            caller,
            self.fetch_unread(&caller.token, target, limit),
        )
        .await
    }

    /// Unread messages across every platform, without an audit record.
    pub async fn unread_snapshot(&self, caller: &Caller, limit: u32) -> Result<Vec<Message>> {
        self.fetch_unread(&caller.token, PlatformTarget::All, limit)
            .await
    }

    async fn fetch_unread(
        &self,
        token: &str,
        target: PlatformTarget,
        limit: u32,
    ) -> Result<Vec<Message>> {
        fan_out(&self.registry, target, |adapter| async move {
            adapter.get_unread_messages(token, limit).await
        })
        .await
    }

    pub async fn send_reply(
        &self,
        caller: &Caller,
        platform: Platform,
        message_id: &str,
        content: &str,
    ) -> Result<Message> {
        self.audited("send_reply", caller, async {
            let adapter = self.registry.get(platform)?;
            Ok(adapter
                .send_reply(&caller.token, message_id, content)
                .await?)
        })
        .await
    }

    pub async fn send_message(
        &self,
        caller: &Caller,
        payload: &SendMessageRequest,
    ) -> Result<Message> {
        self.audited("send_message", caller, async {
            let adapter = self.registry.get(payload.platform)?;
            Ok(adapter.send_message(&caller.token, payload).await?)
        })
        .await
    }

    /// Marks each id in order and stops at the first failure.
    ///
    /// The batch fails as a whole; ids processed before the failure stay
    /// marked on the back-end.
    pub async fn mark_as_read(
        &self,
        caller: &Caller,
        platform: Platform,
        message_ids: &[String],
    ) -> Result<Vec<Message>> {
        self.audited("mark_as_read", caller, async {
            let adapter = self.registry.get(platform)?;
            let mut updated = Vec::with_capacity(message_ids.len());
            for message_id in message_ids {
                match adapter.mark_as_read(&caller.token, message_id).await {
                    Ok(message) => updated.push(message),
                    Err(err) => {
                        tracing::warn!(
                            %platform,
                            message_id = %message_id,
                            already_marked = updated.len(),
                            "Batch mark-as-read aborted"
                        );
                        return Err(err.into());
                    }
                }
            }
            Ok(updated)
        })
        .await
    }

    pub async fn get_platforms(&self, caller: &Caller) -> Result<Vec<PlatformStatus>> {
        self.audited("get_platforms", caller, async {
            let merged = fan_out(&self.registry, PlatformTarget::All, |adapter| async move {
                adapter.get_platforms(&caller.token).await
            })
            .await?;
            Ok(dedup_statuses(merged))
        })
        .await
    }

    pub async fn get_thread(
        &self,
        caller: &Caller,
        platform: Platform,
        thread_id: &str,
    ) -> Result<ThreadDetail> {
        self.audited("get_thread", caller, async {
            let adapter = self.registry.get(platform)?;
            Ok(adapter.get_thread(&caller.token, thread_id).await?)
        })
        .await
    }

    /// Orders messages by priority. `criteria` is echoed back; urgency is the only ordering.
    pub fn prioritize_messages(
        &self,
        caller: &Caller,
        messages: Vec<Value>,
        criteria: String,
    ) -> PrioritizedMessages {
        let messages = rank_by_priority(messages);
        self.record("prioritize_messages", caller.user_id(), CallStatus::Success);
        PrioritizedMessages { criteria, messages }
    }

    pub fn summarize_threads(
        &self,
        caller: &Caller,
        platform: String,
        thread_id: Option<String>,
    ) -> ThreadSummary {
        self.record("summarize_threads", caller.user_id(), CallStatus::NotImplemented);
        ThreadSummary {
            phase: 2,
            platform,
            thread_id,
            summary: "Thread summarization integration is planned for phase 2.".to_string(),
        }
    }

    pub fn search_messages(&self, caller: &Caller, platform: String, query: String) -> SearchResults {
        self.record("search_messages", caller.user_id(), CallStatus::NotImplemented);
        SearchResults {
            phase: 3,
            platform,
            query,
            result: "Search service is planned for phase 3.".to_string(),
        }
    }
}
