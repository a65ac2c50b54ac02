//! Dispatch error taxonomy

use bridge_printer::PrintError;
use thiserror::Error;

use super::types::ErrorKind;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("Missing {0} parameter")]
    MissingParameter(&'static str),

    #[error("Printer unavailable: {0}")]
    PrinterUnavailable(String),

    #[error("Print submission failed: {0}")]
    SubmissionFailed(String),

    #[error("HTML rendering failed: {0}")]
    RenderingFailed(String),

    #[error("Invalid base64 payload: {0}")]
    DecodeFailed(String),

    #[error("Failed to write print artifact: {0}")]
    ArtifactWrite(#[from] std::io::Error),

    #[error("Failed to enumerate printers: {0}")]
    Enumeration(String),

    #[error("Print worker failed: {0}")]
    WorkerFailed(String),
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::UnsupportedContentType(_) => ErrorKind::UnsupportedContentType,
            DispatchError::MissingParameter(_) => ErrorKind::MissingParameter,
            DispatchError::PrinterUnavailable(_) => ErrorKind::PrinterUnavailable,
            DispatchError::SubmissionFailed(_) => ErrorKind::SubmissionFailed,
            DispatchError::RenderingFailed(_) => ErrorKind::RenderingFailed,
            DispatchError::DecodeFailed(_) => ErrorKind::DecodeFailed,
            DispatchError::ArtifactWrite(_) => ErrorKind::ArtifactWrite,
            DispatchError::Enumeration(_) => ErrorKind::EnumerationFailed,
            DispatchError::WorkerFailed(_) => ErrorKind::WorkerFailed,
        }
    }
}

impl From<PrintError> for DispatchError {
    fn from(err: PrintError) -> Self {
        match err {
            PrintError::PrinterUnavailable(name) => DispatchError::PrinterUnavailable(name),
            PrintError::Enumeration(msg) => DispatchError::Enumeration(msg),
            other => DispatchError::SubmissionFailed(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for DispatchError {
    fn from(err: tokio::task::JoinError) -> Self {
        DispatchError::WorkerFailed(err.to_string())
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;
