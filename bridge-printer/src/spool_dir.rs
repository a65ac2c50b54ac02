//! Spool directory backend
//!
//! Each configured printer is a sub-directory of the spool root; every job
//! becomes one `.prn` file holding the raw bytes. A printer whose directory
//! contains a `.paused` marker reports `Busy/Error`.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::error::{JobStep, PrintError, PrintResult};
use crate::spooler::{JobPayload, PrinterDescriptor, PrinterDetails, PrinterStatus, Spooler};

const PAUSED_MARKER: &str = ".paused";
const JOB_EXTENSION: &str = "prn";

/// Spooler that writes jobs into per-printer directories
#[derive(Debug, Clone)]
pub struct DirectorySpooler {
    root: PathBuf,
    printers: Vec<String>,
}

impl DirectorySpooler {
    /// Create a spooler over `root` exposing `printers`; the first is the default
    pub fn new(root: impl Into<PathBuf>, printers: Vec<String>) -> Self {
        Self {
            root: root.into(),
            printers,
        }
    }

    /// Directory that receives jobs for `printer`
    ///
    /// ASCII letters, digits and `-` are kept; every other byte becomes `_XX`,
    /// so distinct printer names never share a directory.
    pub fn printer_dir(&self, printer: &str) -> PathBuf {
        let mut safe = String::with_capacity(printer.len());
        for byte in printer.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                safe.push(byte as char);
            } else {
                safe.push_str(&format!("_{:02X}", byte));
            }
        }
        self.root.join(safe)
    }

    /// Job files spooled for `printer`, oldest first
    pub fn jobs(&self, printer: &str) -> PrintResult<Vec<PathBuf>> {
        let dir = self.printer_dir(printer);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut jobs: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == JOB_EXTENSION))
            .collect();
        jobs.sort();
        Ok(jobs)
    }

    fn is_known(&self, printer: &str) -> bool {
        self.printers.iter().any(|p| p == printer)
    }

    fn probe(&self, printer: &str) -> PrintResult<PrinterStatus> {
        let dir = self.printer_dir(printer);
        match fs::metadata(&dir) {
            Ok(meta) if meta.is_dir() => {
                if dir.join(PAUSED_MARKER).exists() {
                    Ok(PrinterStatus::BusyOrError)
                } else {
                    Ok(PrinterStatus::Ready)
                }
            }
            Ok(_) => Err(PrintError::Enumeration(format!(
                "{} is not a directory",
                dir.display()
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PrinterStatus::Ready),
            Err(e) => Err(e.into()),
        }
    }
}

impl Spooler for DirectorySpooler {
    #[instrument(skip(self, job), fields(printer = %printer))]
    fn submit(&self, printer: &str, job: &JobPayload) -> PrintResult<()> {
        if !self.is_known(printer) {
            return Err(PrintError::PrinterUnavailable(printer.to_string()));
        }

        let dir = self.printer_dir(printer);
        fs::create_dir_all(&dir)
            .map_err(|e| PrintError::PrinterUnavailable(format!("{}: {}", printer, e)))?;

        let data = job.read()?;
        let name = format!(
            "job-{}-{}.{}",
            chrono::Utc::now().format("%Y%m%dT%H%M%S%.6f"),
            uuid::Uuid::new_v4().simple(),
            JOB_EXTENSION
        );
        let path = dir.join(name);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| PrintError::step(JobStep::StartDocument, e.to_string()))?;
        file.write_all(&data)
            .map_err(|e| PrintError::step(JobStep::Write, e.to_string()))?;
        file.sync_all()
            .map_err(|e| PrintError::step(JobStep::EndDocument, e.to_string()))?;

        info!(bytes = data.len(), path = %path.display(), "Print job spooled");
        Ok(())
    }

    fn list(&self) -> PrintResult<Vec<PrinterDescriptor>> {
        Ok(self
            .printers
            .iter()
            .map(|name| {
                let status = self.probe(name).unwrap_or_else(|e| {
                    warn!(printer = %name, error = %e, "Printer status probe failed");
                    PrinterStatus::Unknown
                });
                PrinterDescriptor::local(name.clone(), status)
            })
            .collect())
    }

    fn default_printer(&self) -> PrintResult<Option<String>> {
        Ok(self.printers.first().cloned())
    }

    fn status(&self, printer: &str) -> PrintResult<PrinterDetails> {
        if !self.is_known(printer) {
            return Err(PrintError::PrinterUnavailable(printer.to_string()));
        }

        Ok(PrinterDetails {
            name: printer.to_string(),
            status: self.probe(printer).unwrap_or(PrinterStatus::Unknown),
            jobs_count: self.jobs(printer)?.len() as u32,
            location: self.printer_dir(printer).display().to_string(),
            comment: "spool directory".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spooler(root: &Path) -> DirectorySpooler {
        DirectorySpooler::new(root, vec!["Front Desk".to_string(), "Kitchen".to_string()])
    }

    #[test]
    fn test_submit_writes_one_job_file() {
        let dir = tempfile::tempdir().unwrap();
        let spooler = spooler(dir.path());

        spooler
            .submit("Kitchen", &JobPayload::Bytes(b"hello".to_vec()))
            .unwrap();

        let jobs = spooler.jobs("Kitchen").unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(fs::read(&jobs[0]).unwrap(), b"hello");
    }

    #[test]
    fn test_unknown_printer_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let result = spooler(dir.path()).submit("Garage", &JobPayload::Bytes(vec![1]));
        assert!(matches!(result, Err(PrintError::PrinterUnavailable(_))));
    }

    #[test]
    fn test_default_is_first_printer() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            spooler(dir.path()).default_printer().unwrap().as_deref(),
            Some("Front Desk")
        );
    }

    #[test]
    fn test_failed_probe_only_affects_its_entry() {
        let dir = tempfile::tempdir().unwrap();
        let spooler = spooler(dir.path());

        // A plain file where the printer directory should be breaks the probe
        fs::write(spooler.printer_dir("Front Desk"), b"not a dir").unwrap();
        fs::create_dir_all(spooler.printer_dir("Kitchen")).unwrap();

        let printers = spooler.list().unwrap();
        assert_eq!(printers.len(), 2);
        assert_eq!(printers[0].name, "Front Desk");
        assert_eq!(printers[0].status, PrinterStatus::Unknown);
        assert_eq!(printers[1].name, "Kitchen");
        assert_eq!(printers[1].status, PrinterStatus::Ready);
        assert_eq!(printers[1].server, "Local");
    }

    #[test]
    fn test_paused_printer_reports_busy() {
        let dir = tempfile::tempdir().unwrap();
        let spooler = spooler(dir.path());
        let kitchen = spooler.printer_dir("Kitchen");
        fs::create_dir_all(&kitchen).unwrap();
        fs::write(kitchen.join(PAUSED_MARKER), b"").unwrap();

        let details = spooler.status("Kitchen").unwrap();
        assert_eq!(details.status, PrinterStatus::BusyOrError);
        assert_eq!(details.jobs_count, 0);
    }

    #[test]
    fn test_similar_names_get_separate_directories() {
        let dir = tempfile::tempdir().unwrap();
        let spooler = DirectorySpooler::new(
            dir.path(),
            vec!["Front Desk".to_string(), "Front_Desk".to_string()],
        );
        assert_ne!(spooler.printer_dir("Front Desk"), spooler.printer_dir("Front_Desk"));

        spooler
            .submit("Front Desk", &JobPayload::Bytes(b"receipt".to_vec()))
            .unwrap();

        assert_eq!(spooler.status("Front Desk").unwrap().jobs_count, 1);
        assert_eq!(spooler.status("Front_Desk").unwrap().jobs_count, 0);
    }

    #[test]
    fn test_printer_dir_escapes_separators() {
        let dir = tempfile::tempdir().unwrap();
        let spooler = spooler(dir.path());
        assert_eq!(spooler.printer_dir("Kitchen"), dir.path().join("Kitchen"));
        assert_eq!(spooler.printer_dir("../up"), dir.path().join("_2E_2E_2Fup"));
    }
}
