// src/gateway/envelope.rs

//! The uniform response envelope.
//!
//! Handlers never build envelopes directly. They return an [`Outcome`] (or an
//! error) and the dispatcher converts it, which keeps the three wire shapes
//! identical across every operation.

use serde_json::{json, Map, Value};

use crate::gateway::contract::Violation;
use crate::gateway::error::GatewayError;

/// What a handler produced when its upstream call succeeded.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success {
        metadata: Value,
        key: &'static str,
        payload: Value,
    },
    /// The lookup worked but matched nothing. `payload` is the typed empty
    /// value for the operation (`[]` for lists, `null` for single records).
    Empty {
        metadata: Value,
        key: &'static str,
        payload: Value,
        message: String,
    },
}

impl Outcome {
    pub fn success(key: &'static str, metadata: Value, payload: Value) -> Self {
        Outcome::Success {
            metadata,
            key,
            payload,
        }
    }

    /// Empty result with `[]` as the payload.
    pub fn empty_list(key: &'static str, metadata: Value, message: impl Into<String>) -> Self {
        Outcome::Empty {
            metadata,
            key,
            payload: Value::Array(Vec::new()),
            message: message.into(),
        }
    }

    /// Empty result with `null` as the payload.
    pub fn empty_record(key: &'static str, metadata: Value, message: impl Into<String>) -> Self {
        Outcome::Empty {
            metadata,
            key,
            payload: Value::Null,
            message: message.into(),
        }
    }

    /// Chooses `empty_list` when `items` has nothing in it.
    pub fn list(
        key: &'static str,
        metadata: Value,
        items: Vec<Value>,
        empty_message: impl Into<String>,
    ) -> Self {
        if items.is_empty() {
            Self::empty_list(key, metadata, empty_message)
        } else {
            Self::success(key, metadata, Value::Array(items))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Empty,
    Error,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Empty => "empty",
            Status::Error => "error",
        }
    }
}

/// One terminal result of a call.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Success {
        metadata: Value,
        key: &'static str,
        payload: Value,
    },
    Empty {
        metadata: Value,
        key: &'static str,
        payload: Value,
        message: String,
    },
    Error {
        kind: &'static str,
        message: String,
        violations: Vec<Violation>,
    },
}

impl Envelope {
    pub fn status(&self) -> Status {
        match self {
            Envelope::Success { .. } => Status::Success,
            Envelope::Empty { .. } => Status::Empty,
            Envelope::Error { .. } => Status::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.status() == Status::Error
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Envelope::Success { .. } => None,
            Envelope::Empty { message, .. } | Envelope::Error { message, .. } => Some(message),
        }
    }

    /// The payload, absent for errors.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Envelope::Success { payload, .. } | Envelope::Empty { payload, .. } => Some(payload),
            Envelope::Error { .. } => None,
        }
    }

    pub fn failure(error: &GatewayError) -> Self {
        let violations = match error {
            GatewayError::Validation(v) => v.clone(),
            _ => Vec::new(),
        };
        Envelope::Error {
            kind: error.kind(),
            message: error.to_string(),
            violations,
        }
    }

    /// Serializes to the JSON wire shape.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert("status".into(), json!(self.status().as_str()));
        match self {
            Envelope::Success {
                metadata,
                key,
                payload,
            } => {
                out.insert("metadata".into(), metadata.clone());
                out.insert((*key).into(), payload.clone());
            }
            Envelope::Empty {
                metadata,
                key,
                payload,
                message,
            } => {
                out.insert("message".into(), json!(message));
                out.insert("metadata".into(), metadata.clone());
                out.insert((*key).into(), payload.clone());
            }
            Envelope::Error {
                kind,
                message,
                violations,
            } => {
                out.insert("kind".into(), json!(kind));
                out.insert("message".into(), json!(message));
                if !violations.is_empty() {
                    out.insert("violations".into(), json!(violations));
                }
            }
        }
        Value::Object(out)
    }

    /// MCP `tools/call` result: the envelope as text content plus the same
    /// value as structured content.
    pub fn to_tool_result(&self) -> Value {
        let body = self.to_json();
        let text = serde_json::to_string(&body).unwrap_or_else(|_| body.to_string());
        json!({
            "content": [{ "type": "text", "text": text }],
            "structuredContent": body,
            "isError": self.is_error(),
        })
    }
}

impl From<Outcome> for Envelope {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success {
                metadata,
                key,
                payload,
            } => Envelope::Success {
                metadata,
                key,
                payload,
            },
            Outcome::Empty {
                metadata,
                key,
                payload,
                message,
            } => Envelope::Empty {
                metadata,
                key,
                payload,
                message,
            },
        }
    }
}

impl From<GatewayError> for Envelope {
    fn from(error: GatewayError) -> Self {
        Envelope::failure(&error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::contract::ViolationReason;
    use crate::providers::ProviderError;

    #[test]
    fn success_shape() {
        let env: Envelope = Outcome::success(
            "owner",
            json!({"domainTld": "miester.mon"}),
            json!("0x0000000000000000000000000000000000000000"),
        )
        .into();
        let body = env.to_json();
        assert_eq!(body["status"], "success");
        assert_eq!(body["metadata"]["domainTld"], "miester.mon");
        assert_eq!(body["owner"], "0x0000000000000000000000000000000000000000");
        assert!(body.get("message").is_none());
    }

    #[test]
    fn empty_list_shape() {
        let env: Envelope = Outcome::list(
            "domains",
            json!({"address": "0xabc"}),
            Vec::new(),
            "No domains found.",
        )
        .into();
        let body = env.to_json();
        assert_eq!(body["status"], "empty");
        assert_eq!(body["domains"], json!([]));
        assert_eq!(body["message"], "No domains found.");
    }

    #[test]
    fn error_shape_has_no_payload() {
        let env = Envelope::failure(&GatewayError::Upstream(ProviderError::Http {
            status: 502,
            message: "Bad Gateway".into(),
        }));
        let body = env.to_json();
        assert_eq!(body["status"], "error");
        assert_eq!(body["kind"], "upstream");
        assert_eq!(body["message"], "HTTP 502: Bad Gateway");
        assert!(body.get("metadata").is_none());
        assert!(body.get("violations").is_none());
        assert!(env.payload().is_none());
    }

    #[test]
    fn validation_error_carries_violations() {
        let env = Envelope::failure(&GatewayError::Validation(vec![Violation {
            field: "address".into(),
            reason: ViolationReason::Missing,
        }]));
        let body = env.to_json();
        assert_eq!(body["kind"], "validation");
        assert_eq!(body["violations"][0]["field"], "address");
        assert_eq!(body["violations"][0]["reason"]["kind"], "missing");
    }

    #[test]
    fn tool_result_marks_errors() {
        let env: Envelope = GatewayError::NotFound("nope".into()).into();
        let result = env.to_tool_result();
        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        let parsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed["status"], "error");
        assert_eq!(parsed["kind"], "not_found");
        assert_eq!(result["structuredContent"], parsed);
    }
}
