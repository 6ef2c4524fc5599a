use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::gateway::contract::ViolationReason;
use crate::gateway::{Envelope, GatewayError, Violation};
use crate::AppState;

/// `GET /api/tools`
pub async fn list_tools_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "tools": state.gateway.tool_listing() }))
}

/// `POST /api/tools/:name`. The body is the arguments object (an empty body
/// means no arguments); the response is the envelope itself.
pub async fn call_tool_handler(
    Path(name): Path<String>,
    State(state): State<AppState>,
    body: Bytes,
) -> impl IntoResponse {
    let args = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(args) => args,
            Err(e) => {
                debug!(tool = %name, error = %e, "unparseable arguments body");
                let envelope = Envelope::from(GatewayError::Validation(vec![Violation {
                    field: "arguments".into(),
                    reason: ViolationReason::Unparseable {
                        expected: "JSON object",
                        value: e.to_string(),
                    },
                }]));
                return (StatusCode::BAD_REQUEST, Json(envelope.to_json()));
            }
        }
    };

    let envelope = state.gateway.call(&name, &args).await;
    (status_code(&envelope), Json(envelope.to_json()))
}

fn status_code(envelope: &Envelope) -> StatusCode {
    match envelope {
        Envelope::Error { kind, .. } => match *kind {
            "validation" => StatusCode::BAD_REQUEST,
            "not_found" => StatusCode::NOT_FOUND,
            "upstream" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
        _ => StatusCode::OK,
    }
}
