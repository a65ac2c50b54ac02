//! Print dispatcher
//!
//! Classifies a request by content type, materializes it, and hands it to
//! the spooler (text, pdf, image) or the HTML renderer. Every failure is
//! folded into a [`PrintOutcome`]; nothing escapes as an error or a panic.
//!
//! Materialization and submission block, so they run together on a
//! `spawn_blocking` worker and the artifact guard is released on that worker
//! once the spooler has consumed it.

use std::path::PathBuf;
use std::sync::Arc;

use bridge_printer::{JobPayload, PrinterDescriptor, PrinterDetails, Spooler};
use chrono::Local;
use tracing::{info, instrument, warn};

use super::error::{DispatchError, DispatchResult};
use super::materializer::Materializer;
use super::renderer::HtmlRenderer;
use super::test_page::test_page_content;
use super::types::{ContentType, PrintOptions, PrintOutcome, PrintRequest};

pub struct PrintDispatcher {
    spooler: Arc<dyn Spooler>,
    renderer: Arc<dyn HtmlRenderer>,
    materializer: Materializer,
    default_printer: Option<String>,
}

impl PrintDispatcher {
    /// `default_printer` is resolved once by the caller and never changes
    pub fn new(
        spooler: Arc<dyn Spooler>,
        renderer: Arc<dyn HtmlRenderer>,
        materializer: Materializer,
        default_printer: Option<String>,
    ) -> Self {
        Self {
            spooler,
            renderer,
            materializer,
            default_printer,
        }
    }

    pub fn default_printer(&self) -> Option<&str> {
        self.default_printer.as_deref()
    }

    /// Dispatch `content` according to `options`
    #[instrument(
        skip(self, content, options),
        fields(content_type = %options.content_type, content_len = content.len())
    )]
    pub async fn dispatch(&self, content: String, options: &PrintOptions) -> PrintOutcome {
        let printer = options
            .printer
            .clone()
            .filter(|p| !p.trim().is_empty())
            .or_else(|| self.default_printer.clone())
            .unwrap_or_default();

        match self.try_dispatch(content, options).await {
            Ok(retained) => {
                info!(printer = %printer, "Content sent to printer");
                let mut outcome =
                    PrintOutcome::succeeded(&printer, format!("Content sent to {}", printer));
                outcome.artifact = retained;
                outcome
            }
            Err(e) => {
                warn!(printer = %printer, error = %e, "Print dispatch failed");
                PrintOutcome::failed(printer, &e)
            }
        }
    }

    async fn try_dispatch(
        &self,
        content: String,
        options: &PrintOptions,
    ) -> DispatchResult<Option<PathBuf>> {
        let request = PrintRequest::parse(content, options, self.default_printer.as_deref())?;

        let spooler = Arc::clone(&self.spooler);
        let renderer = Arc::clone(&self.renderer);
        let materializer = self.materializer.clone();

        tokio::task::spawn_blocking(move || execute(&request, &materializer, &*spooler, &*renderer))
            .await?
    }

    /// Synthesize and print a test page on `printer` (or the default)
    pub async fn print_test_page(&self, printer: Option<String>) -> PrintOutcome {
        let target = printer
            .filter(|p| !p.trim().is_empty())
            .or_else(|| self.default_printer.clone())
            .unwrap_or_default();

        let mut options = PrintOptions::new(ContentType::Text.as_str());
        if !target.is_empty() {
            options.printer = Some(target.clone());
        }

        let content = test_page_content(&target, Local::now());
        let mut outcome = self.dispatch(content, &options).await;
        outcome.message = if outcome.success {
            format!("Test page sent to {}", outcome.printer)
        } else {
            format!("Failed to send test page: {}", outcome.message)
        };
        outcome
    }

    /// Point-in-time printer listing
    pub async fn list_printers(&self) -> DispatchResult<Vec<PrinterDescriptor>> {
        let spooler = Arc::clone(&self.spooler);
        let printers = tokio::task::spawn_blocking(move || spooler.list()).await??;
        Ok(printers)
    }

    /// Detailed status of one printer
    pub async fn printer_status(&self, printer: String) -> DispatchResult<PrinterDetails> {
        let spooler = Arc::clone(&self.spooler);
        let details = tokio::task::spawn_blocking(move || spooler.status(&printer)).await??;
        Ok(details)
    }
}

/// Blocking half of a dispatch; returns the retained artifact path, if any
fn execute(
    request: &PrintRequest,
    materializer: &Materializer,
    spooler: &dyn Spooler,
    renderer: &dyn HtmlRenderer,
) -> DispatchResult<Option<PathBuf>> {
    let artifact = materializer.materialize(&request.content, request.content_type)?;

    let submitted: DispatchResult<()> = match request.content_type {
        ContentType::Html => renderer.render(artifact.path(), &request.printer),
        ContentType::Text | ContentType::Pdf | ContentType::Image => spooler
            .submit(
                &request.printer,
                &JobPayload::File(artifact.path().to_path_buf()),
            )
            .map_err(DispatchError::from),
    };

    // Released on every path, success or not
    let retained = artifact.release();
    submitted.map(|()| retained)
}
