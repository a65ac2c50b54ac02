//! # bridge-printer
//!
//! Platform print gateway - hands raw jobs to the operating system spooler.
//!
//! ## Scope
//!
//! This crate handles HOW a job reaches a printer:
//! - Windows spooler (Win32 `OpenPrinter` / `WritePrinter`)
//! - CUPS command-line tools (`lp`, `lpstat`) on Unix
//! - A spool directory backend for development and tests
//! - Printer enumeration with a live status probe per printer
//!
//! Deciding WHAT to print (content types, artifacts, test pages) stays in
//! `print-bridge`.
//!
//! ## Example
//!
//! ```ignore
//! use bridge_printer::{JobPayload, Spooler, SystemSpooler};
//!
//! let spooler = SystemSpooler::new();
//! let printer = spooler.default_printer()?.expect("no default printer");
//! spooler.submit(&printer, &JobPayload::Bytes(b"hello\n".to_vec()))?;
//! ```

mod cups;
mod error;
mod spool_dir;
mod spooler;

#[cfg(windows)]
mod windows;

// Re-exports
pub use cups::CupsSpooler;
pub use error::{JobStep, PrintError, PrintResult};
pub use spool_dir::DirectorySpooler;
pub use spooler::{JobPayload, PrinterDescriptor, PrinterDetails, PrinterStatus, Spooler};

#[cfg(windows)]
pub use windows::WindowsSpooler;

/// The spooler backed by the host operating system
#[cfg(windows)]
pub type SystemSpooler = WindowsSpooler;

/// The spooler backed by the host operating system
#[cfg(not(windows))]
pub type SystemSpooler = CupsSpooler;
