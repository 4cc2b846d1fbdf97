//! JSON-RPC 2.0 envelope types and the tool-calling dispatcher.

pub mod dispatch;
pub mod tools;

pub use dispatch::dispatch;
pub use tools::{tool_definitions, ToolDefinition};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const JSONRPC_VERSION: &str = "2.0";

pub mod codes {
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const TOOL_EXECUTION_FAILED: i64 = -32000;
    pub const UNAUTHORIZED: i64 = -32001;
}

fn default_version() -> String {
    JSONRPC_VERSION.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl RpcRequest {
    /// `params` as a mapping; absent or null params are an empty mapping.
    pub fn params_object(&self) -> Option<Map<String, Value>> {
        match &self.params {
            None | Some(Value::Null) => Some(Map::new()),
            Some(Value::Object(map)) => Some(map.clone()),
            Some(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcOutcome {
    Result { result: Value },
    Error { error: RpcError },
}

/// A reply carrying exactly one of `result` or `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(flatten)]
    pub outcome: RpcOutcome,
}

impl RpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            outcome: RpcOutcome::Result { result },
        }
    }

    pub fn failure(id: Option<Value>, code: i64, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            outcome: RpcOutcome::Error {
                error: RpcError {
                    code,
                    message: message.into(),
                    data,
                },
            },
        }
    }

    pub fn error(&self) -> Option<&RpcError> {
        match &self.outcome {
            RpcOutcome::Error { error } => Some(error),
            RpcOutcome::Result { .. } => None,
        }
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            RpcOutcome::Result { result } => Some(result),
            RpcOutcome::Error { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_serializes_exactly_one_member() {
        let ok = serde_json::to_value(RpcResponse::success(Some(json!(1)), json!({"a": 1}))).unwrap();
        assert_eq!(ok, json!({"jsonrpc": "2.0", "id": 1, "result": {"a": 1}}));

        let err = serde_json::to_value(RpcResponse::failure(
            Some(json!("x")),
            codes::UNAUTHORIZED,
            "Unauthorized",
            None,
        ))
        .unwrap();
        assert_eq!(
            err,
            json!({"jsonrpc": "2.0", "id": "x", "error": {"code": -32001, "message": "Unauthorized"}})
        );
        assert!(err.get("result").is_none());
    }

    #[test]
    fn test_request_defaults() {
        let request: RpcRequest = serde_json::from_value(json!({"method": "ping"})).unwrap();
        assert_eq!(request.jsonrpc, "2.0");
        assert_eq!(request.id, None);
        assert_eq!(request.params_object(), Some(Map::new()));

        let request: RpcRequest =
            serde_json::from_value(json!({"method": "x", "params": [1, 2]})).unwrap();
        assert_eq!(request.params_object(), None);
    }
}
