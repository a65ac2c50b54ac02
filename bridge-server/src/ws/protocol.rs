//! WebSocket print protocol
//!
//! JSON text frames tagged by `type`, shared by the `/ws` endpoint and the
//! outbound [`PrintClient`](super::PrintClient).
//!
//! | Inbound | Reply `data` |
//! |---------|--------------|
//! | `getPrinters` | [`PrinterListing`] |
//! | `printTest` | [`PrintOutcome`] |
//! | `print` | [`PrintReceipt`] |
//!
//! Anything that does not parse gets `{"type":"error","message":...}`.

use bridge_printer::{PrinterDescriptor, PrinterStatus};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::printing::{PrintDispatcher, PrintOptions, PrintOutcome};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundMessage {
    GetPrinters,
    PrintTest {
        #[serde(default)]
        printer: Option<String>,
    },
    Print {
        #[serde(default)]
        content: String,
        /// Overrides `options.printer` when present
        #[serde(default)]
        printer: Option<String>,
        #[serde(default)]
        options: PrintOptions,
    },
}

impl InboundMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            InboundMessage::GetPrinters => "getPrinters",
            InboundMessage::PrintTest { .. } => "printTest",
            InboundMessage::Print { .. } => "print",
        }
    }
}

/// `{type, success, data?, error?}`
#[derive(Debug, Clone, Serialize)]
pub struct Reply<T> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Reply<T> {
    fn ok(kind: &'static str, data: T) -> Self {
        Self {
            kind,
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn failed(kind: &'static str, error: impl Into<String>) -> Self {
        Self {
            kind,
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterEntry {
    pub name: String,
    pub server: String,
    pub status: PrinterStatus,
    pub is_default: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterListing {
    pub printers: Vec<PrinterEntry>,
    pub count: usize,
    pub default_printer: Option<String>,
}

impl PrinterListing {
    pub fn new(printers: Vec<PrinterDescriptor>, default_printer: Option<&str>) -> Self {
        let printers: Vec<PrinterEntry> = printers
            .into_iter()
            .map(|p| PrinterEntry {
                is_default: default_printer == Some(p.name.as_str()),
                name: p.name,
                server: p.server,
                status: p.status,
            })
            .collect();

        Self {
            count: printers.len(),
            printers,
            default_printer: default_printer.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintReceipt {
    pub printer: String,
    pub content_length: usize,
    pub timestamp: DateTime<Local>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProtocolError {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub message: String,
}

impl ProtocolError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: "error",
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Welcome {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub client_id: String,
    pub message: String,
}

impl Welcome {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            kind: "welcome",
            client_id: client_id.into(),
            message: "Connected to print-bridge".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutboundMessage {
    Printers(Reply<PrinterListing>),
    PrintTest(Reply<PrintOutcome>),
    Print(Reply<PrintReceipt>),
    Error(ProtocolError),
    Welcome(Welcome),
}

impl OutboundMessage {
    pub fn to_json(&self) -> String {
        // Every variant is plain data; serialization cannot fail
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"serialization failed: {}"}}"#, e)
        })
    }
}

/// Handle one parsed message
pub async fn handle(dispatcher: &PrintDispatcher, message: InboundMessage) -> OutboundMessage {
    let kind = message.kind();
    debug!(kind, "Handling WebSocket message");

    match message {
        InboundMessage::GetPrinters => match dispatcher.list_printers().await {
            Ok(printers) => OutboundMessage::Printers(Reply::ok(
                kind,
                PrinterListing::new(printers, dispatcher.default_printer()),
            )),
            Err(e) => {
                warn!(error = %e, "Printer listing failed");
                OutboundMessage::Printers(Reply::failed(kind, e.to_string()))
            }
        },
        InboundMessage::PrintTest { printer } => {
            let outcome = dispatcher.print_test_page(printer).await;
            let error = (!outcome.success).then(|| outcome.message.clone());
            OutboundMessage::PrintTest(Reply {
                kind,
                success: outcome.success,
                data: Some(outcome),
                error,
            })
        }
        InboundMessage::Print {
            content,
            printer,
            mut options,
        } => {
            if printer.is_some() {
                options.printer = printer;
            }
            let content_length = content.chars().count();
            let outcome = dispatcher.dispatch(content, &options).await;
            OutboundMessage::Print(Reply {
                kind,
                success: outcome.success,
                error: (!outcome.success).then(|| outcome.message.clone()),
                data: Some(PrintReceipt {
                    printer: outcome.printer,
                    content_length,
                    timestamp: outcome.timestamp,
                }),
            })
        }
    }
}

/// Handle one raw text frame
pub async fn handle_text(dispatcher: &PrintDispatcher, text: &str) -> OutboundMessage {
    match serde_json::from_str::<InboundMessage>(text) {
        Ok(message) => handle(dispatcher, message).await,
        Err(e) => {
            warn!(error = %e, "Unrecognised WebSocket message");
            OutboundMessage::Error(ProtocolError::new(unrecognised_reason(text, &e)))
        }
    }
}

fn unrecognised_reason(text: &str, e: &serde_json::Error) -> String {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => match value.get("type").and_then(|t| t.as_str()) {
            Some(kind) => format!("Unknown message type: {}", kind),
            None => format!("Invalid message: {}", e),
        },
        Err(_) => format!("Invalid JSON: {}", e),
    }
}
