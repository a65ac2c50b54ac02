//! Spooler trait and the types it exchanges

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{JobStep, PrintError, PrintResult};

/// Trait for spooler backends
///
/// Every method blocks on the operating system. Async callers are expected
/// to run them on a blocking worker (`tokio::task::spawn_blocking`).
pub trait Spooler: Send + Sync {
    /// Submit one raw job to `printer`
    fn submit(&self, printer: &str, job: &JobPayload) -> PrintResult<()>;

    /// Enumerate local and connected printers, probing each one's status
    ///
    /// A failed probe marks that entry [`PrinterStatus::Unknown`]; it never
    /// aborts the listing.
    fn list(&self) -> PrintResult<Vec<PrinterDescriptor>>;

    /// Name of the system default printer, if one is configured
    fn default_printer(&self) -> PrintResult<Option<String>>;

    /// Detailed status of a single printer
    fn status(&self, printer: &str) -> PrintResult<PrinterDetails>;
}

/// Data handed to the spooler for one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobPayload {
    /// A file whose bytes are sent unmodified
    File(PathBuf),
    /// Bytes already in memory
    Bytes(Vec<u8>),
}

impl JobPayload {
    /// Load the raw bytes of this payload
    pub fn read(&self) -> PrintResult<Cow<'_, [u8]>> {
        match self {
            JobPayload::File(path) => std::fs::read(path)
                .map(Cow::Owned)
                .map_err(|e| PrintError::step(JobStep::ReadPayload, format!("{}: {}", path.display(), e))),
            JobPayload::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
        }
    }
}

/// Live printer status as reported by the probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrinterStatus {
    Ready,
    #[serde(rename = "Busy/Error")]
    BusyOrError,
    Unknown,
}

impl PrinterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrinterStatus::Ready => "Ready",
            PrinterStatus::BusyOrError => "Busy/Error",
            PrinterStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for PrinterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a printer listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterDescriptor {
    pub name: String,
    /// Hosting server, or `Local`
    pub server: String,
    pub status: PrinterStatus,
}

impl PrinterDescriptor {
    pub fn local(name: impl Into<String>, status: PrinterStatus) -> Self {
        Self {
            name: name.into(),
            server: "Local".to_string(),
            status,
        }
    }
}

/// Detailed status of a single printer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterDetails {
    pub name: String,
    pub status: PrinterStatus,
    pub jobs_count: u32,
    pub location: String,
    pub comment: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_like_the_listing_contract() {
        let json = serde_json::to_string(&PrinterStatus::BusyOrError).unwrap();
        assert_eq!(json, "\"Busy/Error\"");
        assert_eq!(PrinterStatus::Ready.to_string(), "Ready");
    }

    #[test]
    fn test_bytes_payload_reads_in_place() {
        let payload = JobPayload::Bytes(b"abc".to_vec());
        assert_eq!(payload.read().unwrap().as_ref(), b"abc");
    }

    #[test]
    fn test_missing_file_payload_fails_at_read_step() {
        let payload = JobPayload::File(PathBuf::from("/definitely/not/here.prn"));
        match payload.read() {
            Err(PrintError::SubmissionFailed { step, .. }) => assert_eq!(step, JobStep::ReadPayload),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
