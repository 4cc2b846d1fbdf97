use crate::models::Platform;
use crate::rpc::codes;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Failure returned by a platform adapter call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("{platform} adapter does not implement {operation}")]
    NotImplemented {
        platform: Platform,
        operation: &'static str,
    },

    #[error("{platform} back-end returned {status}: {detail}")]
    Upstream {
        platform: Platform,
        status: u16,
        detail: String,
    },

    #[error("{platform} back-end unreachable: {detail}")]
    Transport { platform: Platform, detail: String },
}

impl AdapterError {
    pub fn platform(&self) -> Platform {
        match self {
            AdapterError::NotImplemented { platform, .. }
            | AdapterError::Upstream { platform, .. }
            | AdapterError::Transport { platform, .. } => *platform,
        }
    }

    fn detail(&self) -> Value {
        match self {
            AdapterError::Upstream { status, detail, .. } => json!({
                "platform": self.platform(),
                "status": status,
                "detail": detail,
            }),
            _ => json!({
                "platform": self.platform(),
                "detail": self.to_string(),
            }),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AdapterError::NotImplemented { .. } => StatusCode::NOT_IMPLEMENTED,
            AdapterError::Upstream { status: 404, .. } => StatusCode::NOT_FOUND,
            AdapterError::Upstream { .. } | AdapterError::Transport { .. } => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid Request")]
    InvalidRequest,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// The named envelope member is not an object.
    #[error("Invalid params: {0} must be an object")]
    InvalidParams(&'static str),

    /// A tool argument failed validation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unsupported platform '{0}'")]
    UnsupportedPlatform(String),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// One member of a multi-platform fan-out failed, aborting the whole call.
    #[error("Fan-out aborted: {0}")]
    Aggregate(AdapterError),
}

impl AppError {
    /// JSON-RPC error code for this failure.
    pub fn rpc_code(&self) -> i64 {
        match self {
            AppError::InvalidRequest => codes::INVALID_REQUEST,
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::InvalidParams(_) => codes::INVALID_PARAMS,
            // Argument validation shares the unknown-tool code.
            AppError::UnknownTool(_)
            | AppError::InvalidArgument(_)
            | AppError::UnsupportedPlatform(_) => codes::METHOD_NOT_FOUND,
            AppError::Adapter(_) | AppError::Aggregate(_) => codes::TOOL_EXECUTION_FAILED,
        }
    }

    /// Optional `data` member of the JSON-RPC error object.
    pub fn rpc_data(&self) -> Option<Value> {
        match self {
            AppError::Adapter(err) | AppError::Aggregate(err) => Some(err.detail()),
            AppError::InvalidParams(field) => Some(json!({ *field: "Expected object" })),
            _ => None,
        }
    }

    /// Whether the failure happened after an adapter was invoked.
    pub fn reached_adapter(&self) -> bool {
        matches!(self, AppError::Adapter(_) | AppError::Aggregate(_))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest
            | AppError::InvalidParams(_)
            | AppError::InvalidArgument(_)
            | AppError::UnsupportedPlatform(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::UnknownTool(_) => StatusCode::NOT_FOUND,
            AppError::Adapter(err) => err.status_code(),
            AppError::Aggregate(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            AppError::Adapter(_) | AppError::Aggregate(_) => {
                tracing::error!(error = %self, "Upstream failure");
            }
            AppError::Unauthorized(reason) => {
                tracing::debug!(reason = %reason, "Rejected unauthenticated request");
            }
            _ => {
                tracing::warn!(error = %self, "Request rejected");
            }
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_codes_follow_taxonomy() {
        assert_eq!(AppError::InvalidRequest.rpc_code(), -32600);
        assert_eq!(AppError::Unauthorized("x".into()).rpc_code(), -32001);
        assert_eq!(AppError::UnknownTool("x".into()).rpc_code(), -32601);
        assert_eq!(AppError::InvalidArgument("x".into()).rpc_code(), -32601);
        assert_eq!(AppError::InvalidParams("params").rpc_code(), -32602);

        let not_impl = AdapterError::NotImplemented {
            platform: Platform::Slack,
            operation: "send_reply",
        };
        assert_eq!(AppError::Adapter(not_impl.clone()).rpc_code(), -32000);
        assert_eq!(AppError::Aggregate(not_impl).rpc_code(), -32000);
    }

    #[test]
    fn test_http_status_mapping() {
        let missing = AdapterError::Upstream {
            platform: Platform::Email,
            status: 404,
            detail: "Message not found".into(),
        };
        let broken = AdapterError::Upstream {
            platform: Platform::Email,
            status: 500,
            detail: "boom".into(),
        };
        let stub = AdapterError::NotImplemented {
            platform: Platform::Whatsapp,
            operation: "mark_as_read",
        };

        assert_eq!(AppError::from(missing).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::from(broken).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(AppError::from(stub).status_code(), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(
            AppError::UnsupportedPlatform("fax".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthorized("Missing bearer token".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_only_adapter_failures_count_as_executed() {
        let upstream = AdapterError::Transport {
            platform: Platform::Email,
            detail: "connection refused".into(),
        };
        assert!(AppError::Adapter(upstream.clone()).reached_adapter());
        assert!(AppError::Aggregate(upstream).reached_adapter());
        assert!(!AppError::UnsupportedPlatform("fax".into()).reached_adapter());
        assert!(!AppError::InvalidArgument("limit".into()).reached_adapter());
    }
}
