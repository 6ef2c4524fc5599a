//! # MCP Handler Module
//!
//! Implements the Model Context Protocol methods on top of the
//! [`Gateway`](crate::gateway::Gateway):
//!
//! - `initialize` - server info, protocol version and the `tools` capability
//! - `tools/list` - every registered operation with its input schema
//! - `tools/call` - validate, invoke and wrap the resulting envelope
//! - `ping`
//!
//! Unknown tool names are not protocol errors. They come back as an `error`
//! envelope inside a normal `tools/call` result, like every other failure
//! of an operation.

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::{
    mcp::protocol::{error_codes, Request, Response, ToolCallParams},
    AppState,
};

pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Main dispatcher for all incoming MCP requests. Notifications yield `None`.
pub async fn handle_mcp_request(req: Request, state: AppState) -> Option<Response> {
    if req.is_notification() {
        debug!(method = %req.method, "notification received");
        return None;
    }
    let id = req.response_id();
    info!(method = %req.method, id = %id, "handling MCP request");

    let response = match req.method.as_str() {
        "initialize" => handle_initialize(id),
        "tools/list" => handle_tools_list(id, &state),
        "tools/call" => handle_tool_call(id, req.params, state).await,
        "ping" => Response::success(id, json!({})),
        _ => Response::error(
            id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", req.method),
        ),
    };

    Some(response)
}

/// Parses one raw message and dispatches it.
pub async fn handle_mcp_message(raw: &str, state: AppState) -> Option<Response> {
    match Request::parse(raw) {
        Ok(req) => handle_mcp_request(req, state).await,
        Err(response) => Some(response),
    }
}

async fn handle_tool_call(id: Value, params: Option<Value>, state: AppState) -> Response {
    let params = match params {
        Some(p @ Value::Object(_)) => p,
        _ => {
            return Response::error(
                id,
                error_codes::INVALID_PARAMS,
                "Missing 'params' object".into(),
            )
        }
    };

    let call: ToolCallParams = match serde_json::from_value(params) {
        Ok(call) => call,
        Err(e) => {
            return Response::error(
                id,
                error_codes::INVALID_PARAMS,
                format!("Invalid tools/call params: {}", e),
            )
        }
    };

    let envelope = state.gateway.call(&call.name, &call.arguments).await;
    Response::success(id, envelope.to_tool_result())
}

fn handle_initialize(id: Value) -> Response {
    let server_info = json!({
        "name": "monad_mcp",
        "version": env!("CARGO_PKG_VERSION")
    });
    let capabilities = json!({ "tools": { "listChanged": false } });
    let instructions =
        "Monad blockchain data gateway: name registry, NFT marketplace, swap router, account indexer, token analytics and launchpad tools.";

    Response::success(
        id,
        json!({
            "serverInfo": server_info,
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": capabilities,
            "instructions": instructions
        }),
    )
}

fn handle_tools_list(id: Value, state: &AppState) -> Response {
    Response::success(
        id,
        json!({ "tools": state.gateway.tool_listing() }),
    )
}
