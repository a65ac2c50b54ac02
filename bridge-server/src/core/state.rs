use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use bridge_printer::{DirectorySpooler, Spooler, SystemSpooler};

use crate::core::Config;
use crate::core::config::PrintBackend;
use crate::printing::{
    CommandRenderer, HtmlRenderer, Materializer, PrintDispatcher, platform_renderer,
};

/// Shared bridge state - cheap to clone, handed to every handler
///
/// | Field | Meaning |
/// |-------|---------|
/// | config | Configuration (immutable) |
/// | dispatcher | Print dispatcher with the startup default printer |
/// | started_at | Process start, for uptime reporting |
/// | ws_clients | Connected `/ws` sessions |
#[derive(Clone)]
pub struct BridgeState {
    pub config: Arc<Config>,
    pub dispatcher: Arc<PrintDispatcher>,
    started_at: Instant,
    ws_clients: Arc<AtomicUsize>,
}

impl BridgeState {
    /// Build the spooler and renderer from `config` and resolve the default
    /// printer once
    pub async fn initialize(config: &Config) -> Self {
        let spooler: Arc<dyn Spooler> = match config.backend {
            PrintBackend::System => Arc::new(SystemSpooler::new()),
            PrintBackend::SpoolDir => Arc::new(DirectorySpooler::new(
                config.spool_dir.clone(),
                config.spool_printers.clone(),
            )),
        };

        let renderer: Arc<dyn HtmlRenderer> = match config
            .html_print_command
            .as_deref()
            .and_then(CommandRenderer::from_command_line)
        {
            Some(command) => Arc::new(command),
            None => platform_renderer(),
        };

        let default_printer = resolve_default_printer(Arc::clone(&spooler)).await;

        let dispatcher = PrintDispatcher::new(
            spooler,
            renderer,
            Materializer::new(config.temp_dir.clone(), config.pdf_output_dir.clone()),
            default_printer,
        );

        Self::with_dispatcher(config.clone(), dispatcher)
    }

    /// Wrap an already-built dispatcher
    pub fn with_dispatcher(config: Config, dispatcher: PrintDispatcher) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher: Arc::new(dispatcher),
            started_at: Instant::now(),
            ws_clients: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn uptime_secs(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }

    pub fn ws_clients(&self) -> usize {
        self.ws_clients.load(Ordering::Relaxed)
    }

    /// Count a WebSocket session for as long as the guard lives
    pub fn track_ws_client(&self) -> WsClientGuard {
        self.ws_clients.fetch_add(1, Ordering::Relaxed);
        WsClientGuard(Arc::clone(&self.ws_clients))
    }
}

pub struct WsClientGuard(Arc<AtomicUsize>);

impl Drop for WsClientGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

async fn resolve_default_printer(spooler: Arc<dyn Spooler>) -> Option<String> {
    match tokio::task::spawn_blocking(move || spooler.default_printer()).await {
        Ok(Ok(Some(name))) => {
            tracing::info!(printer = %name, "Default printer resolved");
            Some(name)
        }
        Ok(Ok(None)) => {
            tracing::warn!("No default printer configured; requests must name a printer");
            None
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Could not resolve default printer");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "Default printer lookup task failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spool_dir_state_resolves_first_printer_as_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::for_spool_dir(dir.path(), &["Kitchen", "Bar"]);

        let state = BridgeState::initialize(&config).await;
        assert_eq!(state.dispatcher.default_printer(), Some("Kitchen"));
    }

    #[tokio::test]
    async fn test_ws_client_guard_counts_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let state = BridgeState::initialize(&Config::for_spool_dir(dir.path(), &["Kitchen"])).await;

        let first = state.track_ws_client();
        let second = state.track_ws_client();
        assert_eq!(state.ws_clients(), 2);
        drop(first);
        assert_eq!(state.ws_clients(), 1);
        drop(second);
        assert_eq!(state.ws_clients(), 0);
    }
}
