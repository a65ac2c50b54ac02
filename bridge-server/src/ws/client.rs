//! PrintClient - outbound WebSocket connection to a print relay
//!
//! 1. Connect to the configured URL
//! 2. Answer `getPrinters` / `printTest` / `print` messages (each on its own task)
//! 3. Keep the connection alive with pings
//! 4. On disconnect wait a fixed delay and reconnect, until shutdown

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::Duration;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use super::protocol;
use crate::printing::PrintDispatcher;

/// WebSocket keepalive ping interval
const WS_PING_INTERVAL_SECS: u64 = 30;
/// Replies queued while the socket is busy
const REPLY_BUFFER: usize = 32;

pub struct PrintClient {
    url: String,
    reconnect_delay: Duration,
    dispatcher: Arc<PrintDispatcher>,
    shutdown: CancellationToken,
}

impl PrintClient {
    pub fn new(
        url: impl Into<String>,
        reconnect_delay: Duration,
        dispatcher: Arc<PrintDispatcher>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            url: url.into(),
            reconnect_delay,
            dispatcher,
            shutdown,
        }
    }

    /// Main run loop - connect, serve messages, reconnect on failure
    pub async fn run(self) {
        tracing::info!(url = %self.url, "PrintClient started");

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            match tokio_tungstenite::connect_async(self.url.as_str()).await {
                Ok((ws, _response)) => {
                    tracing::info!(url = %self.url, "Connected to print relay");
                    self.run_session(ws).await;
                }
                Err(e) => {
                    tracing::warn!(
                        delay_secs = self.reconnect_delay.as_secs(),
                        "WebSocket connection failed, retrying: {e}"
                    );
                }
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.reconnect_delay) => {},
            }
        }

        tracing::info!("PrintClient stopped");
    }

    /// Run a single session until disconnect or shutdown
    async fn run_session<S>(&self, ws: S)
    where
        S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
            + futures::Sink<Message, Error = tokio_tungstenite::tungstenite::Error>
            + Unpin,
    {
        let (mut ws_sink, mut ws_stream) = ws.split();
        let (reply_tx, mut reply_rx) = mpsc::channel::<String>(REPLY_BUFFER);

        let mut ping_interval = tokio::time::interval(Duration::from_secs(WS_PING_INTERVAL_SECS));
        ping_interval.tick().await; // skip immediate tick

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("PrintClient shutting down");
                    let _ = ws_sink.close().await;
                    return;
                }

                Some(reply) = reply_rx.recv() => {
                    if let Err(e) = ws_sink.send(Message::Text(reply.into())).await {
                        tracing::warn!("Failed to send reply, disconnecting: {e}");
                        return;
                    }
                }

                _ = ping_interval.tick() => {
                    if ws_sink.send(Message::Ping(vec![].into())).await.is_err() {
                        tracing::warn!("WS ping failed, disconnecting");
                        return;
                    }
                }

                msg = ws_stream.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            // A slow print job must not hold up other messages
                            let dispatcher = Arc::clone(&self.dispatcher);
                            let reply_tx = reply_tx.clone();
                            let text = text.as_str().to_owned();
                            tokio::spawn(async move {
                                let reply = protocol::handle_text(&dispatcher, &text).await;
                                let _ = reply_tx.send(reply.to_json()).await;
                            });
                        }
                        Some(Ok(Message::Ping(data))) => {
                            let _ = ws_sink.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) => {
                            tracing::info!("WebSocket closed by server");
                            return;
                        }
                        Some(Err(e)) => {
                            tracing::warn!("WebSocket error: {e}");
                            return;
                        }
                        None => {
                            tracing::info!("WebSocket stream ended");
                            return;
                        }
                        _ => {} // Binary, Pong - ignore
                    }
                }
            }
        }
    }
}
