//! Error types for the printer library

use std::fmt;
use thiserror::Error;

/// A single step of the raw job pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStep {
    ReadPayload,
    StartDocument,
    StartPage,
    Write,
    EndPage,
    EndDocument,
    Close,
}

impl JobStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStep::ReadPayload => "read payload",
            JobStep::StartDocument => "start document",
            JobStep::StartPage => "start page",
            JobStep::Write => "write",
            JobStep::EndPage => "end page",
            JobStep::EndDocument => "end document",
            JobStep::Close => "close",
        }
    }
}

impl fmt::Display for JobStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// The printer could not be opened or resolved
    #[error("Printer unavailable: {0}")]
    PrinterUnavailable(String),

    /// One step of the job pipeline failed; the handle was still released
    #[error("Print job failed at {step}: {reason}")]
    SubmissionFailed { step: JobStep, reason: String },

    /// The spooler could not enumerate printers
    #[error("Printer enumeration failed: {0}")]
    Enumeration(String),

    /// IO error outside the job pipeline
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation not available on this backend
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl PrintError {
    pub(crate) fn step(step: JobStep, reason: impl Into<String>) -> Self {
        PrintError::SubmissionFailed {
            step,
            reason: reason.into(),
        }
    }
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_failed_names_step() {
        let err = PrintError::step(JobStep::StartPage, "spooler refused");
        assert_eq!(
            err.to_string(),
            "Print job failed at start page: spooler refused"
        );
    }
}
