//! Platform adapters.
//!
//! Each adapter translates the gateway's uniform tool contract into calls
//! against one messaging back-end. Every method returns an
//! [`AdapterResult`], so stubs and live back-ends are handled the same way
//! by the aggregation layer.

pub mod http;
pub mod registry;
pub mod stub;

pub use http::HttpBackendAdapter;
pub use registry::AdapterRegistry;
pub use stub::StubAdapter;

use crate::error::AdapterError;
use crate::models::{Message, Platform, PlatformStatus, SendMessageRequest, ThreadDetail};
use async_trait::async_trait;

pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    async fn get_unread_messages(&self, token: &str, limit: u32) -> AdapterResult<Vec<Message>>;

    async fn send_reply(&self, token: &str, message_id: &str, content: &str)
        -> AdapterResult<Message>;

    async fn send_message(&self, token: &str, payload: &SendMessageRequest)
        -> AdapterResult<Message>;

    async fn mark_as_read(&self, token: &str, message_id: &str) -> AdapterResult<Message>;

    async fn get_platforms(&self, token: &str) -> AdapterResult<Vec<PlatformStatus>>;

    async fn get_thread(&self, token: &str, thread_id: &str) -> AdapterResult<ThreadDetail>;
}
