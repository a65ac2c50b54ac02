use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Which spooler backend receives print jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintBackend {
    /// The operating system spooler (Win32 or CUPS)
    System,
    /// Jobs are written into `SPOOL_DIR`
    SpoolDir,
}

impl FromStr for PrintBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(PrintBackend::System),
            "spool-dir" | "spool_dir" | "spooldir" => Ok(PrintBackend::SpoolDir),
            other => Err(format!("unknown print backend: {}", other)),
        }
    }
}

/// Bridge configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | HTTP_PORT | 8081 | HTTP listen port |
/// | BIND_ADDR | 0.0.0.0 | HTTP listen address |
/// | WS_SERVER_URL | ws://localhost:3001 | WebSocket client target |
/// | WS_RECONNECT_DELAY_SECS | 5 | Delay between client reconnects |
/// | PRINT_BACKEND | system | `system` or `spool-dir` |
/// | SPOOL_DIR | ./spool | Spool directory root |
/// | SPOOL_PRINTERS | Default_Printer | Comma-separated spool printers |
/// | PDF_OUTPUT_DIR | current dir | Retained PDF location |
/// | TEMP_DIR | OS temp dir | Transient artifact location |
/// | HTML_PRINT_COMMAND | platform default | HTML renderer command line |
/// | LOG_LEVEL | info | tracing filter |
/// | LOG_DIR | unset | Daily rolling log directory |
///
/// # Example
///
/// ```ignore
/// PRINT_BACKEND=spool-dir SPOOL_PRINTERS=Kitchen,Bar HTTP_PORT=9000 print-bridge serve
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub bind_addr: IpAddr,
    pub ws_server_url: String,
    pub ws_reconnect_delay_secs: u64,
    pub backend: PrintBackend,
    pub spool_dir: PathBuf,
    pub spool_printers: Vec<String>,
    pub pdf_output_dir: PathBuf,
    pub temp_dir: PathBuf,
    /// `{file}` and `{printer}` are substituted; `None` = platform default
    pub html_print_command: Option<String>,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables fall back to their defaults
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8081),
            bind_addr: std::env::var("BIND_ADDR")
                .ok()
                .and_then(|a| a.parse().ok())
                .unwrap_or(IpAddr::from([0, 0, 0, 0])),
            ws_server_url: std::env::var("WS_SERVER_URL")
                .unwrap_or_else(|_| "ws://localhost:3001".into()),
            ws_reconnect_delay_secs: std::env::var("WS_RECONNECT_DELAY_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5),
            backend: std::env::var("PRINT_BACKEND")
                .ok()
                .and_then(|b| b.parse().ok())
                .unwrap_or(PrintBackend::System),
            spool_dir: std::env::var("SPOOL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("spool")),
            spool_printers: std::env::var("SPOOL_PRINTERS")
                .ok()
                .map(|v| parse_list(&v))
                .filter(|list| !list.is_empty())
                .unwrap_or_else(|| vec!["Default_Printer".to_string()]),
            pdf_output_dir: std::env::var("PDF_OUTPUT_DIR")
                .map(PathBuf::from)
                .or_else(|_| std::env::current_dir())
                .unwrap_or_else(|_| PathBuf::from(".")),
            temp_dir: std::env::var("TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir()),
            html_print_command: std::env::var("HTML_PRINT_COMMAND")
                .ok()
                .filter(|c| !c.trim().is_empty()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
        }
    }

    /// Spool-directory configuration rooted at `root`
    ///
    /// Used by tests and local development
    pub fn for_spool_dir(root: impl Into<PathBuf>, printers: &[&str]) -> Self {
        let root = root.into();
        let mut config = Self::from_env();
        config.backend = PrintBackend::SpoolDir;
        config.spool_printers = printers.iter().map(|p| p.to_string()).collect();
        config.pdf_output_dir = root.join("pdf");
        config.temp_dir = root.join("tmp");
        config.spool_dir = root.join("spool");
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parse() {
        assert_eq!("system".parse::<PrintBackend>(), Ok(PrintBackend::System));
        assert_eq!("Spool-Dir".parse::<PrintBackend>(), Ok(PrintBackend::SpoolDir));
        assert!("ipp".parse::<PrintBackend>().is_err());
    }

    #[test]
    fn test_parse_list_skips_blanks() {
        assert_eq!(parse_list(" Kitchen, ,Bar ,"), vec!["Kitchen", "Bar"]);
    }

    #[test]
    fn test_for_spool_dir_roots_every_path() {
        let config = Config::for_spool_dir("/srv/bridge", &["Kitchen"]);
        assert_eq!(config.backend, PrintBackend::SpoolDir);
        assert_eq!(config.spool_printers, vec!["Kitchen"]);
        assert_eq!(config.spool_dir, PathBuf::from("/srv/bridge/spool"));
        assert_eq!(config.temp_dir, PathBuf::from("/srv/bridge/tmp"));
        assert_eq!(config.pdf_output_dir, PathBuf::from("/srv/bridge/pdf"));
    }
}
