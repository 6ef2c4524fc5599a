use axum::{extract::State, response::IntoResponse, Json};

use crate::AppState;

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "tools": state.gateway.catalog().len(),
    }))
}
