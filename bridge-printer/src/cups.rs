//! CUPS spooler backend
//!
//! Drives the CUPS command-line clients: `lpstat` for discovery and status,
//! `lp -o raw` for job submission. Output is parsed in the C locale.

use std::io::Write;
use std::process::{Command, Output, Stdio};

use tracing::{debug, info, instrument, warn};

use crate::error::{JobStep, PrintError, PrintResult};
use crate::spooler::{JobPayload, PrinterDescriptor, PrinterDetails, PrinterStatus, Spooler};

const JOB_TITLE: &str = "print-bridge job";

/// CUPS spooler (via `lp` / `lpstat`)
#[derive(Debug, Clone)]
pub struct CupsSpooler {
    lp: String,
    lpstat: String,
}

impl Default for CupsSpooler {
    fn default() -> Self {
        Self::new()
    }
}

impl CupsSpooler {
    pub fn new() -> Self {
        Self {
            lp: "lp".to_string(),
            lpstat: "lpstat".to_string(),
        }
    }

    /// Use alternative client binaries (e.g. absolute paths)
    pub fn with_programs(lp: impl Into<String>, lpstat: impl Into<String>) -> Self {
        Self {
            lp: lp.into(),
            lpstat: lpstat.into(),
        }
    }

    fn lpstat(&self, args: &[&str]) -> std::io::Result<Output> {
        Command::new(&self.lpstat)
            .args(args)
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .output()
    }

    /// Run `lpstat -p <name>`; `Err` means the printer does not resolve
    fn printer_line(&self, name: &str) -> PrintResult<String> {
        let output = self
            .lpstat(&["-p", name])
            .map_err(|e| PrintError::PrinterUnavailable(format!("{}: {}", name, e)))?;

        if !output.status.success() {
            return Err(PrintError::PrinterUnavailable(format!(
                "{}: {}",
                name,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn probe(&self, name: &str) -> PrinterStatus {
        match self.printer_line(name) {
            Ok(text) => parse_printer_state(&text),
            Err(e) => {
                warn!(printer = %name, error = %e, "Printer status probe failed");
                PrinterStatus::Unknown
            }
        }
    }
}

impl Spooler for CupsSpooler {
    #[instrument(skip(self, job), fields(printer = %printer))]
    fn submit(&self, printer: &str, job: &JobPayload) -> PrintResult<()> {
        // Resolving the destination stands in for OpenPrinter
        self.printer_line(printer)?;
        let data = job.read()?;

        let mut child = Command::new(&self.lp)
            .args(["-d", printer, "-o", "raw", "-t", JOB_TITLE])
            .env("LC_ALL", "C")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PrintError::step(JobStep::StartDocument, format!("{}: {}", self.lp, e)))?;

        let write_result = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&data),
            None => Err(std::io::Error::other("lp stdin not captured")),
        };

        // stdin is closed by now; always reap the child
        let output = child
            .wait_with_output()
            .map_err(|e| PrintError::step(JobStep::EndDocument, e.to_string()))?;

        write_result.map_err(|e| PrintError::step(JobStep::Write, e.to_string()))?;

        if !output.status.success() {
            return Err(PrintError::step(
                JobStep::EndDocument,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        info!(bytes = data.len(), response = %stdout.trim(), "Print job sent to CUPS");
        Ok(())
    }

    fn list(&self) -> PrintResult<Vec<PrinterDescriptor>> {
        let output = self
            .lpstat(&["-e"])
            .map_err(|e| PrintError::Enumeration(format!("{}: {}", self.lpstat, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // lpstat exits non-zero when no destinations exist
            if stderr.contains("No destinations added") {
                return Ok(Vec::new());
            }
            return Err(PrintError::Enumeration(stderr.trim().to_string()));
        }

        let names = parse_destinations(&String::from_utf8_lossy(&output.stdout));
        debug!(count = names.len(), "CUPS destinations enumerated");

        Ok(names
            .into_iter()
            .map(|name| {
                let status = self.probe(&name);
                let server = destination_server(&name);
                PrinterDescriptor {
                    name,
                    server,
                    status,
                }
            })
            .collect())
    }

    fn default_printer(&self) -> PrintResult<Option<String>> {
        let output = self
            .lpstat(&["-d"])
            .map_err(|e| PrintError::Enumeration(format!("{}: {}", self.lpstat, e)))?;
        Ok(parse_default_destination(&String::from_utf8_lossy(&output.stdout)))
    }

    fn status(&self, printer: &str) -> PrintResult<PrinterDetails> {
        let output = self
            .lpstat(&["-l", "-p", printer])
            .map_err(|e| PrintError::PrinterUnavailable(format!("{}: {}", printer, e)))?;
        if !output.status.success() {
            return Err(PrintError::PrinterUnavailable(printer.to_string()));
        }
        let detail = String::from_utf8_lossy(&output.stdout);

        let jobs_count = match self.lpstat(&["-o", printer]) {
            Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout)
                .lines()
                .filter(|l| !l.trim().is_empty())
                .count() as u32,
            _ => 0,
        };

        Ok(PrinterDetails {
            name: printer.to_string(),
            status: parse_printer_state(&detail),
            jobs_count,
            location: labelled_value(&detail, "Location:").unwrap_or_default(),
            comment: labelled_value(&detail, "Description:").unwrap_or_default(),
        })
    }
}

/// `lpstat -e`: one destination per line
fn parse_destinations(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// `lpstat -d`: "system default destination: NAME"
fn parse_default_destination(text: &str) -> Option<String> {
    text.lines()
        .find_map(|line| line.strip_prefix("system default destination:"))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// `lpstat -p`: "printer NAME is idle." / "now printing" / "disabled since"
fn parse_printer_state(text: &str) -> PrinterStatus {
    let first = text.lines().next().unwrap_or_default();
    if first.contains(" is idle") {
        PrinterStatus::Ready
    } else if first.contains("now printing") || first.contains("disabled") {
        PrinterStatus::BusyOrError
    } else {
        PrinterStatus::Unknown
    }
}

/// Remote CUPS queues are named `queue@host`
fn destination_server(name: &str) -> String {
    match name.split_once('@') {
        Some((_, host)) if !host.is_empty() => host.to_string(),
        _ => "Local".to_string(),
    }
}

fn labelled_value(text: &str, label: &str) -> Option<String> {
    text.lines()
        .find_map(|line| line.trim().strip_prefix(label))
        .map(|v| v.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_destination() {
        assert_eq!(
            parse_default_destination("system default destination: Office_Laser\n"),
            Some("Office_Laser".to_string())
        );
        assert_eq!(parse_default_destination("no system default destination\n"), None);
    }

    #[test]
    fn test_parse_printer_state() {
        assert_eq!(
            parse_printer_state("printer Office is idle.  enabled since Mon Jan  1 10:00:00 2024\n"),
            PrinterStatus::Ready
        );
        assert_eq!(
            parse_printer_state("printer Office now printing Office-12.  enabled since Mon\n"),
            PrinterStatus::BusyOrError
        );
        assert_eq!(
            parse_printer_state("printer Office disabled since Mon -\n\tPaused\n"),
            PrinterStatus::BusyOrError
        );
        assert_eq!(parse_printer_state(""), PrinterStatus::Unknown);
    }

    #[test]
    fn test_destinations_and_servers() {
        let names = parse_destinations("Office\n\nLabel@printhost\n");
        assert_eq!(names, vec!["Office", "Label@printhost"]);
        assert_eq!(destination_server("Office"), "Local");
        assert_eq!(destination_server("Label@printhost"), "printhost");
    }

    #[test]
    fn test_labelled_value() {
        let detail = "printer Office is idle.\n\tDescription: Front desk\n\tLocation: Lobby\n";
        assert_eq!(labelled_value(detail, "Location:").as_deref(), Some("Lobby"));
        assert_eq!(labelled_value(detail, "Description:").as_deref(), Some("Front desk"));
        assert_eq!(labelled_value(detail, "Alerts:"), None);
    }

    #[test]
    fn test_missing_lpstat_marks_printer_unknown() {
        let spooler = CupsSpooler::with_programs("/nonexistent/lp", "/nonexistent/lpstat");
        assert_eq!(spooler.probe("Office"), PrinterStatus::Unknown);
        assert!(matches!(
            spooler.submit("Office", &JobPayload::Bytes(b"x".to_vec())),
            Err(PrintError::PrinterUnavailable(_))
        ));
    }
}
