//! API routes
//!
//! | Path | Method | Module |
//! |------|--------|--------|
//! | /printers | GET | [`printers`] |
//! | /printers/{name}/status | GET | [`printers`] |
//! | /print-content | POST | [`print`] |
//! | /print-test | GET | [`print`] |
//! | /health | GET | [`health`] |
//! | /api/status | GET | [`health`] |
//! | /ws | GET (upgrade) | [`ws`] |
//!
//! Unmatched paths get a JSON 404.

pub mod health;
pub mod print;
pub mod printers;
pub mod ws;

use axum::{Json, Router, http::StatusCode, middleware, response::IntoResponse};
use tower_http::cors::CorsLayer;

use crate::core::BridgeState;
use crate::utils::ErrorBody;

/// HTTP request logging middleware
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let status = response.status();

    tracing::info!(target: "http_access", "{} {} {}", method, uri, status);

    response
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new("Endpoint not found")))
}

/// Build the router (without state)
pub fn build_app() -> Router<BridgeState> {
    Router::<BridgeState>::new()
        .merge(printers::router())
        .merge(print::router())
        .merge(health::router())
        .merge(ws::router())
        .fallback(not_found)
}

/// Router bound to `state`, with CORS and access logging
pub fn app(state: BridgeState) -> Router {
    build_app()
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(log_request))
}
