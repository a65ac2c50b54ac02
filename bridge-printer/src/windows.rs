//! Windows spooler backend
//!
//! Uses the Win32 print spooler API to send RAW jobs through installed
//! printer drivers.

use core::ffi::c_void;

use tracing::{info, instrument, warn};
use windows::Win32::Graphics::Printing::{
    ClosePrinter, DOC_INFO_1W, EndDocPrinter, EndPagePrinter, EnumPrintersW, GetDefaultPrinterW,
    GetPrinterW, OpenPrinterW, PRINTER_ENUM_CONNECTIONS, PRINTER_ENUM_LOCAL, PRINTER_HANDLE,
    PRINTER_INFO_2W, PRINTER_INFO_4W, PRINTER_INFO_6, StartDocPrinterW, StartPagePrinter,
    WritePrinter,
};
use windows::core::{PCWSTR, PWSTR};

use crate::error::{JobStep, PrintError, PrintResult};
use crate::spooler::{JobPayload, PrinterDescriptor, PrinterDetails, PrinterStatus, Spooler};

const DOC_NAME: &str = "print-bridge job";

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Read a possibly-null wide string owned by a spooler buffer
unsafe fn read_wide(ptr: PWSTR) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        unsafe { ptr.to_string().unwrap_or_default() }
    }
}

/// Open printer handle, closed on drop
struct PrinterHandle(PRINTER_HANDLE);

impl PrinterHandle {
    fn open(name: &str) -> PrintResult<Self> {
        let name_w = to_wide(name);
        let mut handle = PRINTER_HANDLE::default();

        unsafe { OpenPrinterW(PCWSTR::from_raw(name_w.as_ptr()), &mut handle, None) }
            .map_err(|e| PrintError::PrinterUnavailable(format!("{}: {}", name, e)))?;

        Ok(Self(handle))
    }

    /// Fetch a `GetPrinterW` info block at `level` into an owned buffer
    fn info(&self, level: u32) -> Option<Vec<u8>> {
        let mut needed: u32 = 0;
        unsafe {
            let _ = GetPrinterW(self.0, level, None, &mut needed);
        }
        if needed == 0 {
            return None;
        }

        let mut buf: Vec<u8> = vec![0; needed as usize];
        let ok = unsafe { GetPrinterW(self.0, level, Some(buf.as_mut_slice()), &mut needed) };
        ok.is_ok().then_some(buf)
    }

    fn status_word(&self) -> Option<u32> {
        let buf = self.info(6)?;
        let info6: PRINTER_INFO_6 = unsafe { read_struct(&buf, 0)? };
        Some(info6.dwStatus)
    }

    /// Close and report the result; `Drop` only covers early-return paths
    fn close(self) -> PrintResult<()> {
        let handle = self.0;
        std::mem::forget(self);
        unsafe { ClosePrinter(handle) }
            .map_err(|e| PrintError::step(JobStep::Close, format!("ClosePrinter failed: {}", e)))
    }
}

/// Copy the `index`-th `T` out of a spooler byte buffer
///
/// Spooler buffers are `Vec<u8>`, so the read must not assume alignment.
/// Pointers inside `T` still refer into `buf`.
unsafe fn read_struct<T>(buf: &[u8], index: usize) -> Option<T> {
    let size = std::mem::size_of::<T>();
    let end = index.checked_add(1)?.checked_mul(size)?;
    if end > buf.len() {
        return None;
    }
    let ptr = unsafe { buf.as_ptr().add(index * size) } as *const T;
    Some(unsafe { std::ptr::read_unaligned(ptr) })
}

impl Drop for PrinterHandle {
    fn drop(&mut self) {
        unsafe {
            let _ = ClosePrinter(self.0);
        }
    }
}

/// Windows driver spooler
#[derive(Debug, Clone, Default)]
pub struct WindowsSpooler;

impl WindowsSpooler {
    pub fn new() -> Self {
        Self
    }

    /// Probe one printer: open it, read PRINTER_INFO_6, close it
    fn probe(name: &str) -> PrinterStatus {
        match PrinterHandle::open(name).ok().and_then(|h| h.status_word()) {
            Some(0) => PrinterStatus::Ready,
            Some(_) => PrinterStatus::BusyOrError,
            None => PrinterStatus::Unknown,
        }
    }

    fn write_raw(name: &str, data: &[u8]) -> PrintResult<()> {
        let handle = PrinterHandle::open(name)?;

        let doc_name_w = to_wide(DOC_NAME);
        let datatype_w = to_wide("RAW");
        let doc_info = DOC_INFO_1W {
            pDocName: PWSTR(doc_name_w.as_ptr() as *mut _),
            pOutputFile: PWSTR::null(),
            pDatatype: PWSTR(datatype_w.as_ptr() as *mut _),
        };

        unsafe {
            if StartDocPrinterW(handle.0, 1, &doc_info as *const DOC_INFO_1W) == 0 {
                return Err(PrintError::step(JobStep::StartDocument, "StartDocPrinterW failed"));
            }

            if !StartPagePrinter(handle.0).as_bool() {
                let _ = EndDocPrinter(handle.0);
                return Err(PrintError::step(JobStep::StartPage, "StartPagePrinter failed"));
            }

            let mut written: u32 = 0;
            let wrote = WritePrinter(
                handle.0,
                data.as_ptr() as *const c_void,
                data.len() as u32,
                &mut written,
            )
            .as_bool();

            let page_ended = EndPagePrinter(handle.0).as_bool();
            let doc_ended = EndDocPrinter(handle.0).as_bool();

            if !wrote {
                return Err(PrintError::step(JobStep::Write, "WritePrinter failed"));
            }
            if written != data.len() as u32 {
                return Err(PrintError::step(
                    JobStep::Write,
                    format!("incomplete write: {} of {} bytes", written, data.len()),
                ));
            }
            if !page_ended {
                return Err(PrintError::step(JobStep::EndPage, "EndPagePrinter failed"));
            }
            if !doc_ended {
                return Err(PrintError::step(JobStep::EndDocument, "EndDocPrinter failed"));
            }
        }

        handle.close()
    }
}

impl Spooler for WindowsSpooler {
    #[instrument(skip(self, job), fields(printer = %printer))]
    fn submit(&self, printer: &str, job: &JobPayload) -> PrintResult<()> {
        let data = job.read()?;
        Self::write_raw(printer, &data)?;
        info!(bytes = data.len(), "Print job sent to spooler");
        Ok(())
    }

    fn list(&self) -> PrintResult<Vec<PrinterDescriptor>> {
        let flags = PRINTER_ENUM_LOCAL | PRINTER_ENUM_CONNECTIONS;
        let mut needed: u32 = 0;
        let mut returned: u32 = 0;

        unsafe {
            let _ = EnumPrintersW(flags, None, 4, None, &mut needed, &mut returned);
        }
        if needed == 0 {
            return Ok(Vec::new());
        }

        let mut buf: Vec<u8> = vec![0; needed as usize];
        unsafe {
            EnumPrintersW(
                flags,
                None,
                4,
                Some(buf.as_mut_slice()),
                &mut needed,
                &mut returned,
            )
        }
        .map_err(|e| PrintError::Enumeration(format!("EnumPrintersW failed: {}", e)))?;

        let mut printers = Vec::with_capacity(returned as usize);
        for index in 0..returned as usize {
            let Some(info) = (unsafe { read_struct::<PRINTER_INFO_4W>(&buf, index) }) else {
                break;
            };
            let name = unsafe { read_wide(info.pPrinterName) };
            if name.is_empty() {
                continue;
            }
            let server = unsafe { read_wide(info.pServerName) };
            let status = Self::probe(&name);
            if status == PrinterStatus::Unknown {
                warn!(printer = %name, "Printer status probe failed");
            }

            printers.push(PrinterDescriptor {
                name,
                server: if server.is_empty() { "Local".to_string() } else { server },
                status,
            });
        }

        Ok(printers)
    }

    fn default_printer(&self) -> PrintResult<Option<String>> {
        unsafe {
            let mut needed: u32 = 0;
            let _ = GetDefaultPrinterW(None, &mut needed);

            if needed == 0 {
                return Ok(None);
            }

            let mut buf: Vec<u16> = vec![0; needed as usize];
            let ok = GetDefaultPrinterW(Some(PWSTR(buf.as_mut_ptr())), &mut needed);

            if !ok.as_bool() {
                return Ok(None);
            }

            let name = PWSTR(buf.as_mut_ptr())
                .to_string()
                .map_err(|e| PrintError::Enumeration(format!("UTF-16 decode failed: {}", e)))?;

            Ok(Some(name))
        }
    }

    fn status(&self, printer: &str) -> PrintResult<PrinterDetails> {
        let handle = PrinterHandle::open(printer)?;
        let buf = handle
            .info(2)
            .ok_or_else(|| PrintError::Enumeration(format!("GetPrinterW failed for {}", printer)))?;
        let info2: PRINTER_INFO_2W = unsafe { read_struct(&buf, 0) }
            .ok_or_else(|| PrintError::Enumeration(format!("short PRINTER_INFO_2 for {}", printer)))?;

        Ok(PrinterDetails {
            name: printer.to_string(),
            status: if info2.Status == 0 {
                PrinterStatus::Ready
            } else {
                PrinterStatus::BusyOrError
            },
            jobs_count: info2.cJobs,
            location: unsafe { read_wide(info2.pLocation) },
            comment: unsafe { read_wide(info2.pComment) },
        })
    }
}
