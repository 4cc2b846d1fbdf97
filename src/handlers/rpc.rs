use crate::rpc::{codes, dispatch, RpcRequest, RpcResponse};
use crate::state::AppState;
use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde_json::Value;
use std::sync::Arc;

/// POST /mcp - JSON-RPC 2.0 tool-calling endpoint.
///
/// Always answers 200 with a JSON-RPC envelope; malformed bodies become
/// `Invalid Request` errors instead of transport errors.
pub async fn rpc_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<RpcResponse> {
    let raw: Value = match serde_json::from_slice(&body) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::debug!(error = %e, "Unparseable JSON-RPC body");
            return Json(invalid_request(None));
        }
    };

    // Keep the id so malformed envelopes can still be correlated.
    let id = raw.get("id").cloned();
    let request: RpcRequest = match serde_json::from_value(raw) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(error = %e, "Malformed JSON-RPC envelope");
            return Json(invalid_request(id));
        }
    };

    Json(dispatch(&state, &headers, request).await)
}

fn invalid_request(id: Option<Value>) -> RpcResponse {
    RpcResponse::failure(id, codes::INVALID_REQUEST, "Invalid Request", None)
}
