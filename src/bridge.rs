//! HTTP bridge adapter
//!
//! Exposes the tool surface to agent runtimes that speak plain HTTP instead
//! of MCP. Every execution answers `200 OK`; tool failures travel inside the
//! result envelope.
//!
//! # Routes
//!
//! - `POST /v1/tools/execute` with `{"tool_name": ..., "arguments": {...}}`
//! - `GET /v1/tools` lists tool names
//! - `GET /health`

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::tools::{MailboxTools, TOOL_NAMES};

/// Execution request body
#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub tool_name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Execution response envelope
#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub result: ExecuteResult,
}

#[derive(Debug, Serialize)]
pub struct ExecuteResult {
    pub output: String,
    pub is_error: bool,
    pub error_code: Option<&'static str>,
}

pub fn router(tools: Arc<MailboxTools>) -> Router {
    Router::new()
        .route("/v1/tools/execute", post(execute))
        .route("/v1/tools", get(list_tools))
        .route("/health", get(health))
        .with_state(tools)
}

async fn execute(
    State(tools): State<Arc<MailboxTools>>,
    Json(request): Json<ExecuteRequest>,
) -> Json<ExecuteResponse> {
    let span = info_span!(
        "bridge_execute",
        request_id = %Uuid::new_v4(),
        tool = %request.tool_name
    );
    async move {
        let outcome = tools.dispatch(&request.tool_name, request.arguments).await;
        let is_error = outcome.is_error();
        let error_code = outcome.error_code();
        info!(is_error, "tool executed");
        Json(ExecuteResponse {
            result: ExecuteResult {
                output: outcome.into_text(),
                is_error,
                error_code,
            },
        })
    }
    .instrument(span)
    .await
}

async fn list_tools() -> Json<Value> {
    Json(json!({ "tools": TOOL_NAMES }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Serve the bridge until Ctrl-C or SIGTERM
pub async fn serve(tools: Arc<MailboxTools>, addr: SocketAddr) -> AppResult<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Internal(format!("failed to bind {addr}: {e}")))?;
    info!(%addr, "http bridge listening");
    axum::serve(listener, router(tools))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Internal(format!("http bridge failed: {e}")))?;
    info!("http bridge stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };
    #[cfg(unix)]
    let term = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut s) = signal(SignalKind::terminate()) {
            s.recv().await;
        }
    };
    #[cfg(not(unix))]
    let term = std::future::pending::<()>();
    tokio::select! {
        _ = ctrl_c => {},
        _ = term => {},
    }
}
