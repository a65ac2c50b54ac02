//! Logging Infrastructure
//!
//! Console logging, plus a daily rolling file when a log directory is given.

use std::path::Path;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize the logger with optional file output
///
/// `log_level` is an `EnvFilter` directive (`info`, `print_bridge=debug,warn`, ...).
/// The file layer is only added when `log_dir` already exists.
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    let console = fmt::layer()
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    let file = log_dir
        .map(Path::new)
        .filter(|path| path.is_dir())
        .map(|path| {
            let appender = tracing_appender::rolling::daily(path, "print-bridge");
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(appender)
        });

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init();
}
