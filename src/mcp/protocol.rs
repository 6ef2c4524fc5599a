// src/mcp/protocol.rs

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,
    /// `None` only when the message has no `id` member; an explicit
    /// `"id": null` is `Some(Value::Null)` and still gets a response.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
}

/// `tools/call` parameters.
#[derive(Debug, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

fn default_jsonrpc() -> String {
    "2.0".to_string()
}

impl Request {
    pub fn new(id: Value, method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: default_jsonrpc(),
            id: Some(id),
            method: method.to_string(),
            params,
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// The id to echo in the response.
    pub fn response_id(&self) -> Value {
        self.id.clone().unwrap_or(Value::Null)
    }

    /// Decodes one JSON-RPC message. Malformed JSON is a parse error; valid
    /// JSON that is not a request is an invalid request, answered with
    /// whatever id could be recovered.
    pub fn parse(raw: &str) -> Result<Self, Response> {
        let value: Value = serde_json::from_str(raw).map_err(|e| {
            Response::error(Value::Null, error_codes::PARSE_ERROR, format!("Parse error: {}", e))
        })?;
        let id = value.get("id").cloned().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| {
            Response::error(id, error_codes::INVALID_REQUEST, format!("Invalid request: {}", e))
        })
    }
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(ErrorObject { code, message }),
        }
    }
}

// Standard JSON-RPC error codes
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn garbage_is_a_parse_error() {
        let err = Request::parse("{not json").unwrap_err();
        assert_eq!(err.error.unwrap().code, error_codes::PARSE_ERROR);
        assert_eq!(err.id, Value::Null);
    }

    #[test]
    fn missing_method_keeps_the_id() {
        let err = Request::parse(r#"{"jsonrpc":"2.0","id":7}"#).unwrap_err();
        assert_eq!(err.id, json!(7));
        assert_eq!(err.error.unwrap().code, error_codes::INVALID_REQUEST);
    }

    #[test]
    fn requests_without_id_are_notifications() {
        let req = Request::parse(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(req.is_notification());
    }

    #[test]
    fn explicit_null_id_is_a_request() {
        let req = Request::parse(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#).unwrap();
        assert!(!req.is_notification());
        assert_eq!(req.response_id(), Value::Null);
    }

    #[test]
    fn success_omits_error() {
        let out = serde_json::to_value(Response::success(json!(1), json!({}))).unwrap();
        assert_eq!(out, json!({ "jsonrpc": "2.0", "id": 1, "result": {} }));
    }
}
