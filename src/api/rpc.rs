use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{mcp::handler::handle_mcp_message, AppState};

/// `POST /api/rpc`: one JSON-RPC message per request. Notifications get
/// `204 No Content`.
pub async fn rpc_handler(State(state): State<AppState>, body: String) -> impl IntoResponse {
    match handle_mcp_message(&body, state).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
