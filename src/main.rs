// src/main.rs

use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use monad_mcp_gateway::{api, config::Config, mcp::session, AppState};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// --- HTTP Server Logic ---
async fn run_http_server(state: AppState) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], state.config.port));
    let app = api::router(state);

    info!("🚀 HTTP Server listening on {}", addr);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {}", addr))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("HTTP server failed")
}

// --- TCP Session Logic ---
async fn run_tcp_server(state: AppState) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], state.config.tcp_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind TCP listener on {}", addr))?;
    info!("🚀 MCP TCP server listening on {}", addr);
    session::serve_tcp(listener, state)
        .await
        .context("TCP server failed")
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout stays a clean protocol channel in --mcp mode.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "monad_mcp_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("❌ Failed to load configuration: {:#}", e);
            return;
        }
    };

    let missing = config.missing_settings();
    if !missing.is_empty() {
        warn!(
            "Not configured: {}. Tools that need them will return an error envelope.",
            missing.join(", ")
        );
    }

    let state = match AppState::from_config(config) {
        Ok(state) => state,
        Err(e) => {
            error!("❌ Failed to initialize gateway: {:#}", e);
            return;
        }
    };
    info!(tools = state.gateway.catalog().len(), "catalog ready");

    // --mcp: one session on stdin/stdout. --tcp: one session per connection.
    // Otherwise the HTTP API.
    let args: Vec<String> = env::args().collect();
    let result = if args.iter().any(|a| a == "--mcp") || env::var("MCP_MODE").is_ok() {
        session::serve_stdio(state).await;
        Ok(())
    } else if args.iter().any(|a| a == "--tcp") {
        run_tcp_server(state).await
    } else {
        run_http_server(state).await
    };

    if let Err(e) = result {
        error!("❌ {:#}", e);
    }
}
