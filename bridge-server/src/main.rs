use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use print_bridge::{BridgeState, Config, PrintClient, Server, print_banner, setup_environment};

#[derive(Parser)]
#[command(
    name = "print-bridge",
    about = "Bridge HTTP and WebSocket print requests to the system spooler",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server and the /ws endpoint (default)
    Serve {
        /// Listen port, overrides HTTP_PORT
        #[arg(long, env = "HTTP_PORT")]
        port: Option<u16>,
    },
    /// Connect to a print relay over WebSocket
    Connect {
        /// Relay URL, overrides WS_SERVER_URL
        #[arg(long, env = "WS_SERVER_URL")]
        url: Option<String>,
    },
    /// Print the printer listing as JSON
    Printers,
    /// Print a test page and show the outcome
    TestPage {
        /// Target printer, defaults to the system default
        #[arg(long)]
        printer: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env first so clap's `env` fallbacks see it
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    setup_environment(&config);

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.http_port = port;
            }
            print_banner();
            tracing::info!("🖨️  print-bridge starting...");

            let state = BridgeState::initialize(&config).await;
            let server = Server::with_state(config, state);
            server
                .run(shutdown_on_ctrl_c())
                .await
                .context("HTTP server failed")?;
        }
        Command::Connect { url } => {
            if let Some(url) = url {
                config.ws_server_url = url;
            }
            let state = BridgeState::initialize(&config).await;
            let client = PrintClient::new(
                config.ws_server_url.clone(),
                Duration::from_secs(config.ws_reconnect_delay_secs),
                state.dispatcher.clone(),
                shutdown_on_ctrl_c(),
            );
            client.run().await;
        }
        Command::Printers => {
            let state = BridgeState::initialize(&config).await;
            let printers = state
                .dispatcher
                .list_printers()
                .await
                .context("Failed to list printers")?;
            let listing = print_bridge::ws::protocol::PrinterListing::new(
                printers,
                state.dispatcher.default_printer(),
            );
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        Command::TestPage { printer } => {
            let state = BridgeState::initialize(&config).await;
            let outcome = state.dispatcher.print_test_page(printer).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if !outcome.success {
                anyhow::bail!(outcome.message);
            }
        }
    }

    Ok(())
}

/// Cancelled on the first Ctrl-C
fn shutdown_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Ctrl-C received");
                trigger.cancel();
            }
            Err(e) => tracing::warn!("Ctrl-C handler unavailable: {e}"),
        }
    });
    token
}
