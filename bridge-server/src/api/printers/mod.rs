//! Printer listing API

mod handler;

use axum::{Router, routing::get};

use crate::core::BridgeState;

pub fn router() -> Router<BridgeState> {
    Router::new()
        .route("/printers", get(handler::list))
        .route("/printers/{name}/status", get(handler::status))
}
