//! Value types exchanged with platform back-ends and returned to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A messaging channel with a registered adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Email,
    Slack,
    Whatsapp,
}

impl Platform {
    /// Every platform, in registry order.
    pub const ALL: [Platform; 3] = [Platform::Email, Platform::Slack, Platform::Whatsapp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Email => "email",
            Platform::Slack => "slack",
            Platform::Whatsapp => "whatsapp",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Platform::Email),
            "slack" => Ok(Platform::Slack),
            "whatsapp" => Ok(Platform::Whatsapp),
            other => Err(format!("Unsupported platform '{}'", other)),
        }
    }
}

/// Either one concrete platform or the `"all"` pseudo-platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformTarget {
    All,
    One(Platform),
}

impl FromStr for PlatformTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(PlatformTarget::All);
        }
        s.parse().map(PlatformTarget::One)
    }
}

impl fmt::Display for PlatformTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformTarget::All => f.write_str("all"),
            PlatformTarget::One(platform) => platform.fmt(f),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    #[default]
    Normal,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageDirection {
    Incoming,
    Outgoing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub user_id: String,
    pub platform: Platform,
    pub sender: String,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub subject: Option<String>,
    pub body: String,
    pub is_unread: bool,
    pub direction: MessageDirection,
    #[serde(default)]
    pub priority: Priority,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadDetail {
    pub id: String,
    pub user_id: String,
    pub platform: Platform,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Health of one platform channel as reported by its adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformStatus {
    pub platform: Platform,
    pub connected: bool,
    pub status: String,
    #[serde(default)]
    pub detail: Option<String>,
}

/// Outbound message payload forwarded to a back-end's send endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub platform: Platform,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub recipients: Vec<String>,
    pub body: String,
    #[serde(default)]
    pub thread_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    Member,
}

/// Identity returned by a successful token introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
    pub role: Role,
}

/// An authenticated caller: the identity plus the bearer token forwarded to back-ends.
#[derive(Debug, Clone)]
pub struct Caller {
    pub token: String,
    pub user: AuthenticatedUser,
}

impl Caller {
    pub fn user_id(&self) -> &str {
        &self.user.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_platform_target_parsing() {
        assert_eq!("all".parse::<PlatformTarget>(), Ok(PlatformTarget::All));
        assert_eq!(
            "slack".parse::<PlatformTarget>(),
            Ok(PlatformTarget::One(Platform::Slack))
        );
        assert!("telegram".parse::<PlatformTarget>().is_err());
        assert!("Email".parse::<Platform>().is_err());
    }

    #[test]
    fn test_message_priority_defaults_to_normal() {
        let message: Message = serde_json::from_value(json!({
            "id": "m1",
            "thread_id": "t1",
            "user_id": "u1",
            "platform": "email",
            "sender": "alice@example.com",
            "body": "hello",
            "is_unread": true,
            "direction": "incoming",
            "sent_at": "2025-01-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(message.priority, Priority::Normal);
        assert!(message.recipients.is_empty());
        assert_eq!(message.subject, None);
    }
}
