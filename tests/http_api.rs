mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use monad_mcp_gateway::api;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    api::router(common::state())
}

async fn send(app: Router, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_reports_catalog_size() {
    let (status, body) = send(app(), Method::GET, "/api/health", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["tools"], 4);
}

#[tokio::test]
async fn tools_listing() {
    let (status, body) = send(app(), Method::GET, "/api/tools", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tools"].as_array().unwrap().len(), 4);
    assert_eq!(body["tools"][0]["name"], "sleep");
}

#[tokio::test]
async fn calling_a_tool_returns_the_envelope() {
    let (status, body) = send(app(), Method::POST, "/api/tools/echo", r#"{"text":"gm","times":3}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["echoes"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn error_kinds_map_to_status_codes() {
    let (status, body) = send(app(), Method::POST, "/api/tools/echo", "{}").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");

    let (status, body) = send(app(), Method::POST, "/api/tools/echo", "{broken").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["violations"][0]["field"], "arguments");

    let (status, body) = send(app(), Method::POST, "/api/tools/missing", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");

    let (status, _) = send(app(), Method::POST, "/api/tools/fail", "").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (status, body) = send(app(), Method::POST, "/api/tools/explode", "").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], "internal");
}

#[tokio::test]
async fn rpc_endpoint_speaks_json_rpc() {
    let call = json!({
        "jsonrpc": "2.0",
        "id": "abc",
        "method": "tools/call",
        "params": { "name": "echo", "arguments": { "text": "hi" } }
    });
    let (status, body) = send(app(), Method::POST, "/api/rpc", &call.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "abc");
    assert_eq!(body["result"]["structuredContent"]["echoes"], json!(["hi"]));

    let note = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
    let (status, body) = send(app(), Method::POST, "/api/rpc", note).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());
}
