//! Health check routes
//!
//! | Path | Method | Meaning |
//! |------|--------|---------|
//! | /health | GET | Liveness and version |
//! | /api/status | GET | Uptime and connected WebSocket clients |
//!
//! # Response example
//!
//! ```json
//! {
//!   "status": "running",
//!   "clients": 2,
//!   "uptime": 3605.2,
//!   "defaultPrinter": "Kitchen"
//! }
//! ```

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::BridgeState;

pub fn router() -> Router<BridgeState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(status))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    default_printer: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    status: &'static str,
    clients: usize,
    /// Seconds since start
    uptime: f64,
    default_printer: Option<String>,
}

pub async fn health(State(state): State<BridgeState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        default_printer: state.dispatcher.default_printer().map(str::to_string),
    })
}

pub async fn status(State(state): State<BridgeState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "running",
        clients: state.ws_clients(),
        uptime: state.uptime_secs(),
        default_printer: state.dispatcher.default_printer().map(str::to_string),
    })
}
