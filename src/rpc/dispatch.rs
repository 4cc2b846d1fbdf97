//! Maps one JSON-RPC request to exactly one JSON-RPC response.
//!
//! # Flow
//! 1. Reject envelopes whose `jsonrpc` is not `"2.0"` (-32600)
//! 2. Answer `initialize`, `tools/list` and `ping` without authentication
//! 3. Introspect the bearer token (-32001 on any failure)
//! 4. Run `tools/call`, or treat any other method as a tool name
//! 5. Convert tool failures into error objects

use super::tools::{call_tool, tool_definitions, Tool};
use super::{codes, RpcRequest, RpcResponse, JSONRPC_VERSION};
use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::http::HeaderMap;
use serde_json::{json, Map, Value};

pub const PROTOCOL_VERSION: &str = "2025-06-18";
pub const SERVER_NAME: &str = "Multi-Platform Inbox MCP Gateway";

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        },
        "capabilities": { "tools": {} },
    })
}

/// Low-cardinality label for the request counter.
fn method_label(method: &str) -> &'static str {
    match method {
        "initialize" => "initialize",
        "tools/list" => "tools/list",
        "ping" => "ping",
        "tools/call" => "tools/call",
        other => other
            .parse::<Tool>()
            .map(|tool| tool.name())
            .unwrap_or("unknown"),
    }
}

pub async fn dispatch(state: &AppState, headers: &HeaderMap, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();
    metrics::counter!("gateway_rpc_requests_total", "method" => method_label(&request.method))
        .increment(1);

    if request.jsonrpc != JSONRPC_VERSION {
        tracing::debug!(version = %request.jsonrpc, "Rejected envelope version");
        return RpcResponse::failure(id, codes::INVALID_REQUEST, "Invalid Request", None);
    }

    match request.method.as_str() {
        "initialize" => return RpcResponse::success(id, initialize_result()),
        "tools/list" => return RpcResponse::success(id, json!({ "tools": tool_definitions() })),
        "ping" => return RpcResponse::success(id, json!({ "status": "pong" })),
        _ => {}
    }

    let caller = match state.authenticate(headers).await {
        Ok(caller) => caller,
        Err(err) => {
            tracing::debug!(method = %request.method, error = %err, "Unauthenticated RPC call");
            return RpcResponse::failure(id, codes::UNAUTHORIZED, "Unauthorized", None);
        }
    };

    let (tool_name, arguments) = match tool_invocation(&request) {
        Ok(invocation) => invocation,
        Err(err) => {
            return RpcResponse::failure(id, err.rpc_code(), "Invalid params", err.rpc_data())
        }
    };

    let outcome = async {
        let tool: Tool = tool_name.parse()?;
        call_tool(&state.service, &caller, tool, arguments).await
    }
    .await;

    match outcome {
        Ok(result) => RpcResponse::success(id, result),
        Err(err) => {
            let message = if err.reached_adapter() {
                "Tool execution failed".to_string()
            } else {
                err.to_string()
            };
            tracing::debug!(tool = %tool_name, code = err.rpc_code(), error = %err, "Tool call failed");
            RpcResponse::failure(id, err.rpc_code(), message, err.rpc_data())
        }
    }
}

/// Tool name and argument mapping for an authenticated request.
///
/// `tools/call` carries them as `name` and `arguments`; any other method is
/// taken as the tool name with `params` as its arguments.
fn tool_invocation(request: &RpcRequest) -> Result<(String, Map<String, Value>)> {
    let params = request
        .params_object()
        .ok_or(AppError::InvalidParams("params"))?;

    if request.method != "tools/call" {
        return Ok((request.method.clone(), params));
    }

    let name = params
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let arguments = match params.get("arguments") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => return Err(AppError::InvalidParams("arguments")),
    };
    Ok((name, arguments))
}
