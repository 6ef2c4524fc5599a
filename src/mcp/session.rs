// src/mcp/session.rs

//! Line-delimited JSON-RPC sessions.
//!
//! A session reads one request per line. Every request runs on its own task
//! so a slow tool never holds up a fast one; responses are funneled through
//! a single writer task and may therefore leave out of order (callers match
//! them by `id`).

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::mcp::handler::handle_mcp_message;
use crate::mcp::protocol::{error_codes, Response};
use crate::AppState;

/// Longest accepted request line.
pub const MAX_LINE_LENGTH: usize = 1024 * 1024;

const RESPONSE_QUEUE: usize = 64;

/// Serves one session until the reader reaches EOF and every in-flight
/// request has been answered (or the writer has failed).
pub async fn serve_session<R, W>(reader: R, writer: W, state: AppState)
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let session = Uuid::new_v4();
    info!(%session, "session opened");

    let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
    let (tx, mut rx) = mpsc::channel::<Response>(RESPONSE_QUEUE);

    let writer_task = tokio::spawn(async move {
        let mut sink = FramedWrite::new(writer, LinesCodec::new());
        while let Some(response) = rx.recv().await {
            let line = match serde_json::to_string(&response) {
                Ok(line) => line,
                Err(e) => {
                    error!(%session, error = %e, "failed to encode response");
                    continue;
                }
            };
            debug!(%session, "sending: {}", line);
            if let Err(e) = sink.send(line).await {
                error!(%session, error = %e, "failed to write response");
                break;
            }
        }
        // Dropping `rx` here makes any late result's send fail, and the
        // request task discards it.
    });

    while let Some(frame) = lines.next().await {
        let line = match frame {
            Ok(line) => line,
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                warn!(%session, "request line too long");
                let response = Response::error(
                    serde_json::Value::Null,
                    error_codes::INVALID_REQUEST,
                    format!("Request exceeds {} bytes", MAX_LINE_LENGTH),
                );
                if tx.send(response).await.is_err() {
                    break;
                }
                continue;
            }
            Err(LinesCodecError::Io(e)) => {
                error!(%session, error = %e, "failed to read request");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        if tx.is_closed() {
            break;
        }

        let tx = tx.clone();
        let state = state.clone();
        tokio::spawn(async move {
            if let Some(response) = handle_mcp_message(line.trim(), state).await {
                if tx.send(response).await.is_err() {
                    debug!(%session, "session closed before the response was ready");
                }
            }
        });
    }

    drop(tx);
    if let Err(e) = writer_task.await {
        error!(%session, error = %e, "writer task failed");
    }
    info!(%session, "session closed");
}

/// Stdio mode: one session on stdin/stdout.
pub async fn serve_stdio(state: AppState) {
    info!("🚀 Starting MCP server on stdin/stdout...");
    serve_session(tokio::io::stdin(), tokio::io::stdout(), state).await;
    info!("MCP server shutting down");
}

/// TCP mode: every accepted connection is an independent session.
pub async fn serve_tcp(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        debug!(%peer, "connection accepted");
        let (reader, writer) = stream.into_split();
        tokio::spawn(serve_session(reader, writer, state.clone()));
    }
}
