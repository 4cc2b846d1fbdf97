use super::{AdapterResult, PlatformAdapter};
use crate::error::AdapterError;
use crate::models::{Message, Platform, PlatformStatus, SendMessageRequest, ThreadDetail};
use async_trait::async_trait;

/// Placeholder for a platform without a live back-end.
///
/// Reads succeed with empty or disconnected results, every other operation
/// fails with [`AdapterError::NotImplemented`].
#[derive(Debug, Clone)]
pub struct StubAdapter {
    platform: Platform,
    detail: String,
}

impl StubAdapter {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            detail: format!("{} adapter is a stub; no back-end configured.", platform),
        }
    }

    fn not_implemented<T>(&self, operation: &'static str) -> AdapterResult<T> {
        Err(AdapterError::NotImplemented {
            platform: self.platform,
            operation,
        })
    }
}

#[async_trait]
impl PlatformAdapter for StubAdapter {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn get_unread_messages(&self, _token: &str, _limit: u32) -> AdapterResult<Vec<Message>> {
        Ok(Vec::new())
    }

    async fn send_reply(
        &self,
        _token: &str,
        _message_id: &str,
        _content: &str,
    ) -> AdapterResult<Message> {
        self.not_implemented("send_reply")
    }

    async fn send_message(
        &self,
        _token: &str,
        _payload: &SendMessageRequest,
    ) -> AdapterResult<Message> {
        self.not_implemented("send_message")
    }

    async fn mark_as_read(&self, _token: &str, _message_id: &str) -> AdapterResult<Message> {
        self.not_implemented("mark_as_read")
    }

    async fn get_platforms(&self, _token: &str) -> AdapterResult<Vec<PlatformStatus>> {
        Ok(vec![PlatformStatus {
            platform: self.platform,
            connected: false,
            status: "stub".to_string(),
            detail: Some(self.detail.clone()),
        }])
    }

    // A thread has no meaningful empty value, so lookups fail like writes do.
    async fn get_thread(&self, _token: &str, _thread_id: &str) -> AdapterResult<ThreadDetail> {
        self.not_implemented("get_thread")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_reads_are_empty() {
        let stub = StubAdapter::new(Platform::Slack);

        assert!(stub.get_unread_messages("t", 10).await.unwrap().is_empty());

        let statuses = stub.get_platforms("t").await.unwrap();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].platform, Platform::Slack);
        assert!(!statuses[0].connected);
        assert_eq!(statuses[0].status, "stub");
    }

    #[tokio::test]
    async fn test_stub_writes_are_not_implemented() {
        let stub = StubAdapter::new(Platform::Whatsapp);

        let err = stub.send_reply("t", "m1", "hi").await.unwrap_err();
        assert_eq!(
            err,
            AdapterError::NotImplemented {
                platform: Platform::Whatsapp,
                operation: "send_reply",
            }
        );
        assert!(matches!(
            stub.mark_as_read("t", "m1").await,
            Err(AdapterError::NotImplemented { .. })
        ));
        assert!(matches!(
            stub.get_thread("t", "th1").await,
            Err(AdapterError::NotImplemented { .. })
        ));
    }
}
