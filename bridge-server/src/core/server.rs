//! Server Implementation
//!
//! HTTP server startup and shutdown

use std::net::SocketAddr;

use tokio_util::sync::CancellationToken;

use crate::api;
use crate::core::error::{Result, ServerError};
use crate::core::{BridgeState, Config};

/// HTTP Server
pub struct Server {
    config: Config,
    state: BridgeState,
}

impl Server {
    /// Create server with existing state (shared with other entry points)
    pub fn with_state(config: Config, state: BridgeState) -> Self {
        Self { config, state }
    }

    /// Serve until `shutdown` is cancelled
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        let app = api::app(self.state.clone());
        let addr = SocketAddr::new(self.config.bind_addr, self.config.http_port);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        tracing::info!("🖨️  print-bridge listening on http://{}", addr);
        tracing::info!("   GET  /printers       - list printers");
        tracing::info!("   POST /print-content  - print content");
        tracing::info!("   GET  /print-test     - print a test page");
        tracing::info!("   GET  /ws             - WebSocket print protocol");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("Shutting down...");
            })
            .await
            .map_err(ServerError::Serve)?;

        Ok(())
    }
}
