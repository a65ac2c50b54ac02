//! HTML print path
//!
//! Raw HTML means nothing to a RAW spooler job, so HTML artifacts are handed
//! to an external browser/document engine running out-of-process.
//!
//! - [`CommandRenderer`] runs a configured command line (`HTML_PRINT_COMMAND`)
//! - [`ScriptRenderer`] writes a helper script and runs it with an interpreter;
//!   on Windows this is the silent Internet Explorer print
//!
//! A renderer that cannot target the requested printer must fail the job
//! rather than print somewhere else.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::sync::Arc;

use tracing::{info, instrument};

use super::error::{DispatchError, DispatchResult};

const FILE_PLACEHOLDER: &str = "{file}";
const PRINTER_PLACEHOLDER: &str = "{printer}";

/// Selects `printer`, prints without a dialog, restores the previous default
const SILENT_PRINT_VBS: &str = include_str!("silent_print.vbs");

/// Prints an HTML file on a named printer
pub trait HtmlRenderer: Send + Sync {
    fn render(&self, html: &Path, printer: &str) -> DispatchResult<()>;
}

/// Silent script print on Windows, CUPS `lp` elsewhere
pub fn platform_renderer() -> Arc<dyn HtmlRenderer> {
    #[cfg(windows)]
    let renderer: Arc<dyn HtmlRenderer> = Arc::new(ScriptRenderer::silent_ie());
    #[cfg(not(windows))]
    let renderer: Arc<dyn HtmlRenderer> = Arc::new(CommandRenderer::new(
        "lp",
        vec![
            "-d".to_string(),
            PRINTER_PLACEHOLDER.to_string(),
            FILE_PLACEHOLDER.to_string(),
        ],
    ));
    renderer
}

fn check_output(program: &str, output: Output) -> DispatchResult<()> {
    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(DispatchError::RenderingFailed(format!(
        "{} exited with {}: {}",
        program,
        output.status,
        stderr.trim()
    )))
}

/// Renderer that runs a command line with `{file}` / `{printer}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
}

impl CommandRenderer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Parse a whitespace-separated command line, e.g. `lp -d {printer} {file}`
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments with placeholders substituted
    pub fn resolved_args(&self, html: &Path, printer: &str) -> Vec<String> {
        let file = html.display().to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(FILE_PLACEHOLDER, &file)
                    .replace(PRINTER_PLACEHOLDER, printer)
            })
            .collect()
    }
}

impl HtmlRenderer for CommandRenderer {
    #[instrument(skip(self), fields(program = %self.program))]
    fn render(&self, html: &Path, printer: &str) -> DispatchResult<()> {
        let output = Command::new(&self.program)
            .args(self.resolved_args(html, printer))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                DispatchError::RenderingFailed(format!("failed to start {}: {}", self.program, e))
            })?;

        check_output(&self.program, output)?;
        info!("HTML document handed to renderer");
        Ok(())
    }
}

/// Renderer that runs an embedded script as `<interpreter> [args] <script> <file> <printer>`
///
/// The script is written next to the HTML artifact and removed afterwards.
/// A non-zero exit (e.g. the printer could not be selected) is a
/// `RenderingFailed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRenderer {
    interpreter: String,
    args: Vec<String>,
    source: String,
    suffix: &'static str,
}

impl ScriptRenderer {
    pub fn new(
        interpreter: impl Into<String>,
        args: Vec<String>,
        source: impl Into<String>,
        suffix: &'static str,
    ) -> Self {
        Self {
            interpreter: interpreter.into(),
            args,
            source: source.into(),
            suffix,
        }
    }

    /// Internet Explorer `ExecWB` print without prompting, run by `cscript`
    pub fn silent_ie() -> Self {
        Self::new(
            "cscript.exe",
            vec!["//NoLogo".to_string()],
            SILENT_PRINT_VBS,
            ".vbs",
        )
    }
}

impl HtmlRenderer for ScriptRenderer {
    #[instrument(skip(self), fields(interpreter = %self.interpreter))]
    fn render(&self, html: &Path, printer: &str) -> DispatchResult<()> {
        let dir = html.parent().unwrap_or_else(|| Path::new("."));
        let mut script = tempfile::Builder::new()
            .prefix("print-bridge-render-")
            .suffix(self.suffix)
            .tempfile_in(dir)?;
        script.write_all(self.source.as_bytes())?;
        script.flush()?;
        let script = script.into_temp_path();

        let output = Command::new(&self.interpreter)
            .args(&self.args)
            .arg(&*script)
            .arg(html)
            .arg(printer)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                DispatchError::RenderingFailed(format!(
                    "failed to start {}: {}",
                    self.interpreter, e
                ))
            })?;

        check_output(&self.interpreter, output)?;
        info!("HTML document printed by script");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_are_substituted() {
        let renderer = CommandRenderer::from_command_line("lp -d {printer} {file}").unwrap();
        assert_eq!(renderer.program(), "lp");
        assert_eq!(
            renderer.resolved_args(Path::new("/tmp/page.html"), "Office"),
            vec!["-d", "Office", "/tmp/page.html"]
        );
    }

    #[test]
    fn test_empty_command_line_is_rejected() {
        assert!(CommandRenderer::from_command_line("   ").is_none());
    }

    #[test]
    fn test_missing_program_is_rendering_failure() {
        let renderer = CommandRenderer::new("/nonexistent/html-printer", vec![]);
        let result = renderer.render(Path::new("page.html"), "Office");
        assert!(matches!(result, Err(DispatchError::RenderingFailed(_))));
    }

    #[test]
    fn test_silent_ie_script_never_prompts_and_selects_printer() {
        let renderer = ScriptRenderer::silent_ie();
        assert_eq!(renderer.interpreter, "cscript.exe");
        // OLECMDID_PRINT with OLECMDEXECOPT_DONTPROMPTUSER
        assert!(renderer.source.contains("ExecWB 6, 2"));
        assert!(renderer.source.contains("SetDefaultPrinter"));
        assert!(!renderer.source.contains("PrintHTML"));
    }

    #[cfg(unix)]
    #[test]
    fn test_script_receives_file_and_printer_and_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let html = dir.path().join("page.html");
        std::fs::write(&html, "<p>hi</p>").unwrap();

        let renderer = ScriptRenderer::new(
            "sh",
            vec![],
            "printf '%s|%s' \"$1\" \"$2\" > \"$1.args\"\n",
            ".sh",
        );
        renderer.render(&html, "Office").unwrap();

        let args = std::fs::read_to_string(dir.path().join("page.html.args")).unwrap();
        assert_eq!(args, format!("{}|Office", html.display()));

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".sh"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_script_that_cannot_select_printer_fails_the_job() {
        let dir = tempfile::tempdir().unwrap();
        let html = dir.path().join("page.html");
        std::fs::write(&html, "<p>hi</p>").unwrap();

        let renderer = ScriptRenderer::new(
            "sh",
            vec![],
            "echo \"cannot select printer $2\" >&2\nexit 2\n",
            ".sh",
        );
        let err = renderer.render(&html, "Ghost").unwrap_err();
        match err {
            DispatchError::RenderingFailed(msg) => assert!(msg.contains("cannot select printer Ghost")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
