//! print-bridge - HTTP and WebSocket front door to the OS print spooler
//!
//! # Module layout
//!
//! ```text
//! bridge-server/src/
//! ├── core/      # config, shared state, HTTP server
//! ├── printing/  # dispatcher, materializer, HTML renderer, test page
//! ├── api/       # HTTP routes and handlers, /ws endpoint
//! ├── ws/        # WebSocket protocol and outbound client
//! └── utils/     # boundary errors, logging
//! ```
//!
//! The spooler backends themselves live in the `bridge-printer` crate.

pub mod api;
pub mod core;
pub mod printing;
pub mod utils;
pub mod ws;

pub use core::{BridgeState, Config, PrintBackend, Server, ServerError};
pub use printing::{PrintDispatcher, PrintOptions, PrintOutcome};
pub use utils::{ApiError, ApiResult};
pub use ws::PrintClient;

pub use utils::logger::init_logger_with_file;

/// Start logging as configured (`LOG_LEVEL`, `LOG_DIR`)
pub fn setup_environment(config: &Config) {
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
}

pub fn print_banner() {
    println!(
        r#"
           _       _        _          _     _
 _ __  _ __(_)_ __ | |_     | |__  _ __(_) __| | __ _  ___
| '_ \| '__| | '_ \| __|____| '_ \| '__| |/ _` |/ _` |/ _ \
| |_) | |  | | | | | ||_____| |_) | |  | | (_| | (_| |  __/
| .__/|_|  |_|_| |_|\__|    |_.__/|_|  |_|\__,_|\__, |\___|
|_|                                             |___/
    "#
    );
}
