//! Print API
//!
//! | Path | Method | Body / Query |
//! |------|--------|--------------|
//! | /print-content | POST | `{content, printer?, content_type?, ...}` |
//! | /print-test | GET | `?printer=NAME` |
//!
//! Dispatch failures are answered with HTTP 200 and `status: "error"`;
//! only a malformed request is a 4xx.

mod handler;

pub use handler::PrintResponse;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::BridgeState;

pub fn router() -> Router<BridgeState> {
    Router::new()
        .route("/print-content", post(handler::print_content))
        .route("/print-test", get(handler::print_test))
}
