//! Printer listing handlers

use axum::Json;
use axum::extract::{Path, State};
use bridge_printer::PrinterDetails;
use serde::Serialize;

use crate::core::BridgeState;
use crate::utils::ApiResult;
use crate::ws::protocol::{PrinterEntry, PrinterListing};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintersResponse {
    pub status: &'static str,
    pub printers: Vec<PrinterEntry>,
    pub count: usize,
    pub default_printer: Option<String>,
}

/// GET /printers
///
/// Every installed printer with a best-effort status. A failed probe marks
/// one printer `Unknown`; only a failed enumeration is an error.
pub async fn list(State(state): State<BridgeState>) -> ApiResult<Json<PrintersResponse>> {
    let printers = state.dispatcher.list_printers().await?;
    let listing = PrinterListing::new(printers, state.dispatcher.default_printer());

    tracing::debug!(count = listing.count, "Printers listed");

    Ok(Json(PrintersResponse {
        status: "success",
        printers: listing.printers,
        count: listing.count,
        default_printer: listing.default_printer,
    }))
}

/// GET /printers/{name}/status
pub async fn status(
    State(state): State<BridgeState>,
    Path(name): Path<String>,
) -> ApiResult<Json<PrinterDetails>> {
    let details = state.dispatcher.printer_status(name).await?;
    Ok(Json(details))
}
