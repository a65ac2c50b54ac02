//! Print handlers

use std::path::PathBuf;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::core::BridgeState;
use crate::printing::{ErrorKind, PrintOptions, PrintOutcome};
use crate::utils::{ApiError, ApiResult};

/// POST /print-content body
#[derive(Debug, Deserialize)]
pub struct PrintContentBody {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(flatten)]
    pub options: PrintOptions,
}

#[derive(Debug, Deserialize)]
pub struct PrintTestQuery {
    pub printer: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintResponse {
    /// success | error
    pub status: &'static str,
    pub message: String,
    pub printer: String,
    pub timestamp: DateTime<Local>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
}

impl From<PrintOutcome> for PrintResponse {
    fn from(outcome: PrintOutcome) -> Self {
        Self {
            status: if outcome.success { "success" } else { "error" },
            message: outcome.message,
            printer: outcome.printer,
            timestamp: outcome.timestamp,
            error: outcome.error,
            artifact: outcome.artifact,
        }
    }
}

/// POST /print-content
pub async fn print_content(
    State(state): State<BridgeState>,
    body: Result<Json<PrintContentBody>, JsonRejection>,
) -> ApiResult<Json<PrintResponse>> {
    let Json(body) = body?;

    let content = body
        .content
        .filter(|c| !c.is_empty())
        .ok_or(ApiError::MissingParameter("content"))?;

    let outcome = state.dispatcher.dispatch(content, &body.options).await;
    Ok(Json(outcome.into()))
}

/// GET /print-test?printer=NAME
pub async fn print_test(
    State(state): State<BridgeState>,
    query: Result<Query<PrintTestQuery>, QueryRejection>,
) -> ApiResult<Json<PrintResponse>> {
    let Query(query) = query?;

    let outcome = state.dispatcher.print_test_page(query.printer).await;
    Ok(Json(outcome.into()))
}
