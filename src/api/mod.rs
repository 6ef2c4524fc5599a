//! # API Module
//!
//! HTTP surface of the gateway.
//!
//! ## Available Endpoints
//!
//! - `GET /api/health` - Liveness and catalog size
//! - `POST /api/rpc` - One MCP JSON-RPC message
//! - `GET /api/tools` - Catalog listing with input schemas
//! - `POST /api/tools/:name` - Call a tool; the body is its arguments and the
//!   response is the envelope. Error envelopes map to 400/404/502/500 by kind.

pub mod health;
pub mod rpc;
pub mod tools;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

/// The full HTTP application: routes under `/api`, request tracing and
/// permissive CORS.
pub fn router(state: AppState) -> Router {
    let api_router = Router::new()
        .route("/health", get(health::health_handler))
        .route("/rpc", post(rpc::rpc_handler))
        .route("/tools", get(tools::list_tools_handler))
        .route("/tools/:name", post(tools::call_tool_handler));

    Router::new()
        .nest("/api", api_router)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
