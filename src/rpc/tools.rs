//! Tool catalog and typed argument decoding.

use crate::error::{AppError, Result};
use crate::models::{Caller, Platform, PlatformTarget, SendMessageRequest};
use crate::service::GatewayService;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::str::FromStr;

pub const MAX_UNREAD_LIMIT: i64 = 100;
pub const DEFAULT_UNREAD_LIMIT: i64 = 50;
pub const MAX_TEXT_LENGTH: usize = 5000;

/// A capability advertised through `tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    GetUnreadMessages,
    SendReply,
    SendMessage,
    GetPlatforms,
    MarkAsRead,
    PrioritizeMessages,
    SummarizeThreads,
    SearchMessages,
}

impl Tool {
    pub const ALL: [Tool; 8] = [
        Tool::GetUnreadMessages,
        Tool::SendReply,
        Tool::SendMessage,
        Tool::GetPlatforms,
        Tool::MarkAsRead,
        Tool::PrioritizeMessages,
        Tool::SummarizeThreads,
        Tool::SearchMessages,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Tool::GetUnreadMessages => "get_unread_messages",
            Tool::SendReply => "send_reply",
            Tool::SendMessage => "send_message",
            Tool::GetPlatforms => "get_platforms",
            Tool::MarkAsRead => "mark_as_read",
            Tool::PrioritizeMessages => "prioritize_messages",
            Tool::SummarizeThreads => "summarize_threads",
            Tool::SearchMessages => "search_messages",
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        let (description, input_schema) = match self {
            Tool::GetUnreadMessages => (
                "Fetch unread messages from one platform or all adapters.",
                json!({
                    "type": "object",
                    "properties": {
                        "platform": {"type": "string", "default": "all"},
                        "limit": {
                            "type": "integer",
                            "minimum": 1,
                            "maximum": MAX_UNREAD_LIMIT,
                            "default": DEFAULT_UNREAD_LIMIT
                        }
                    }
                }),
            ),
            Tool::SendReply => (
                "Send a reply to a message through the selected platform adapter.",
                json!({
                    "type": "object",
                    "required": ["platform", "message_id", "content"],
                    "properties": {
                        "platform": {"type": "string"},
                        "message_id": {"type": "string"},
                        "content": {"type": "string"}
                    }
                }),
            ),
            Tool::SendMessage => (
                "Send a new outbound message.",
                json!({
                    "type": "object",
                    "required": ["platform", "body"],
                    "properties": {
                        "platform": {"type": "string"},
                        "thread_id": {"type": "string"},
                        "subject": {"type": "string"},
                        "recipients": {"type": "array", "items": {"type": "string"}},
                        "body": {"type": "string"}
                    }
                }),
            ),
            Tool::GetPlatforms => (
                "Get platform status from all adapters.",
                json!({"type": "object"}),
            ),
            Tool::MarkAsRead => (
                "Mark messages as read on a selected platform.",
                json!({
                    "type": "object",
                    "required": ["platform", "message_ids"],
                    "properties": {
                        "platform": {"type": "string"},
                        "message_ids": {"type": "array", "items": {"type": "string"}}
                    }
                }),
            ),
            Tool::PrioritizeMessages => (
                "Sort messages by urgency/importance criteria.",
                json!({
                    "type": "object",
                    "required": ["messages"],
                    "properties": {
                        "messages": {"type": "array", "items": {"type": "object"}},
                        "criteria": {"type": "string", "default": "urgency"}
                    }
                }),
            ),
            Tool::SummarizeThreads => (
                "Phase 2 placeholder for thread summarization.",
                json!({
                    "type": "object",
                    "properties": {
                        "thread_id": {"type": "string"},
                        "platform": {"type": "string", "default": "email"}
                    }
                }),
            ),
            Tool::SearchMessages => (
                "Phase 3 placeholder for cross-platform search.",
                json!({
                    "type": "object",
                    "required": ["query"],
                    "properties": {
                        "query": {"type": "string"},
                        "platform": {"type": "string", "default": "all"}
                    }
                }),
            ),
        };

        ToolDefinition {
            name: self.name(),
            description,
            input_schema,
        }
    }
}

impl FromStr for Tool {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Tool::ALL
            .into_iter()
            .find(|tool| tool.name() == s)
            .ok_or_else(|| AppError::UnknownTool(s.to_string()))
    }
}

pub fn tool_definitions() -> Vec<ToolDefinition> {
    Tool::ALL.iter().map(Tool::definition).collect()
}

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
struct GetUnreadArgs {
    #[serde(default = "default_all")]
    platform: String,
    #[serde(default = "default_limit")]
    limit: i64,
}

#[derive(Debug, Deserialize)]
struct SendReplyArgs {
    platform: String,
    message_id: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct SendMessageArgs {
    platform: String,
    body: String,
    #[serde(default)]
    thread_id: Option<String>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    recipients: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MarkAsReadArgs {
    platform: String,
    message_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PrioritizeArgs {
    messages: Vec<Value>,
    #[serde(default = "default_criteria")]
    criteria: String,
}

#[derive(Debug, Deserialize)]
struct SummarizeArgs {
    #[serde(default)]
    thread_id: Option<String>,
    #[serde(default = "default_email")]
    platform: String,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default = "default_all")]
    platform: String,
}

fn decode<T: DeserializeOwned>(tool: Tool, args: Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(args))
        .map_err(|e| AppError::InvalidArgument(format!("{}: {}", tool.name(), e)))
}

/// Parse a platform name that may be `"all"`.
pub fn parse_target(raw: &str) -> Result<PlatformTarget> {
    raw.parse()
        .map_err(|_| AppError::UnsupportedPlatform(raw.to_string()))
}

/// Parse a platform name that must address exactly one adapter.
pub fn parse_platform(raw: &str) -> Result<Platform> {
    raw.parse()
        .map_err(|_| AppError::UnsupportedPlatform(raw.to_string()))
}

pub fn validate_limit(limit: i64) -> Result<u32> {
    if (1..=MAX_UNREAD_LIMIT).contains(&limit) {
        Ok(limit as u32)
    } else {
        Err(AppError::InvalidArgument(format!(
            "limit must be between 1 and {}",
            MAX_UNREAD_LIMIT
        )))
    }
}

pub fn validate_text(field: &str, value: &str) -> Result<()> {
    let length = value.chars().count();
    if length == 0 || length > MAX_TEXT_LENGTH {
        return Err(AppError::InvalidArgument(format!(
            "{} must be between 1 and {} characters",
            field, MAX_TEXT_LENGTH
        )));
    }
    Ok(())
}

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| AppError::InvalidArgument(format!("Unserializable result: {}", e)))
}

/// Decode `args` for `tool` and run it against the gateway service.
pub async fn call_tool(
    service: &GatewayService,
    caller: &Caller,
    tool: Tool,
    args: Map<String, Value>,
) -> Result<Value> {
    match tool {
        Tool::GetUnreadMessages => {
            let args: GetUnreadArgs = decode(tool, args)?;
            let target = parse_target(&args.platform)?;
            let limit = validate_limit(args.limit)?;
            let messages = service.get_unread_messages(caller, target, limit).await?;
            Ok(json!({ "messages": messages }))
        }
        Tool::SendReply => {
            let args: SendReplyArgs = decode(tool, args)?;
            let platform = parse_platform(&args.platform)?;
            validate_text("content", &args.content)?;
            let message = service
                .send_reply(caller, platform, &args.message_id, &args.content)
                .await?;
            to_json(message)
        }
        Tool::SendMessage => {
            let args: SendMessageArgs = decode(tool, args)?;
            let platform = parse_platform(&args.platform)?;
            validate_text("body", &args.body)?;
            let payload = SendMessageRequest {
                platform,
                subject: args.subject,
                recipients: args.recipients,
                body: args.body,
                thread_id: args.thread_id,
            };
            to_json(service.send_message(caller, &payload).await?)
        }
        Tool::GetPlatforms => {
            let platforms = service.get_platforms(caller).await?;
            Ok(json!({ "platforms": platforms }))
        }
        Tool::MarkAsRead => {
            let args: MarkAsReadArgs = decode(tool, args)?;
            let platform = parse_platform(&args.platform)?;
            let messages = service
                .mark_as_read(caller, platform, &args.message_ids)
                .await?;
            Ok(json!({ "messages": messages }))
        }
        Tool::PrioritizeMessages => {
            let args: PrioritizeArgs = decode(tool, args)?;
            let messages = args.messages.into_iter().filter(Value::is_object).collect();
            to_json(service.prioritize_messages(caller, messages, args.criteria))
        }
        Tool::SummarizeThreads => {
            let args: SummarizeArgs = decode(tool, args)?;
            to_json(service.summarize_threads(caller, args.platform, args.thread_id))
        }
        Tool::SearchMessages => {
            let args: SearchArgs = decode(tool, args)?;
            to_json(service.search_messages(caller, args.platform, args.query))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lists_every_tool_once() {
        let names: Vec<&str> = tool_definitions().iter().map(|t| t.name).collect();
        assert_eq!(names.len(), 8);
        for tool in Tool::ALL {
            assert_eq!(names.iter().filter(|n| **n == tool.name()).count(), 1);
            assert_eq!(tool.name().parse::<Tool>().unwrap(), tool);
        }
    }

    #[test]
    fn test_definition_uses_input_schema_key() {
        let value = serde_json::to_value(Tool::MarkAsRead.definition()).unwrap();
        assert_eq!(value["inputSchema"]["required"], json!(["platform", "message_ids"]));
    }

    #[test]
    fn test_unknown_tool_name() {
        assert!(matches!(
            "nonexistent_tool".parse::<Tool>(),
            Err(AppError::UnknownTool(name)) if name == "nonexistent_tool"
        ));
    }

    #[test]
    fn test_limit_bounds() {
        assert_eq!(validate_limit(1).unwrap(), 1);
        assert_eq!(validate_limit(100).unwrap(), 100);
        assert!(validate_limit(0).is_err());
        assert!(validate_limit(101).is_err());
    }

    #[test]
    fn test_concrete_platform_rejects_all() {
        assert!(matches!(parse_platform("all"), Err(AppError::UnsupportedPlatform(_))));
        assert_eq!(parse_target("all").unwrap(), PlatformTarget::All);
    }

    #[test]
    fn test_text_validation() {
        assert!(validate_text("content", "hi").is_ok());
        assert!(validate_text("content", "").is_err());
        assert!(validate_text("content", &"x".repeat(MAX_TEXT_LENGTH + 1)).is_err());
    }
}
