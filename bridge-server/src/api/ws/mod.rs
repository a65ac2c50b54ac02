//! `/ws` endpoint
//!
//! Greets each client with a `welcome` message, then answers protocol
//! messages. Each message is handled on its own task; replies are funnelled
//! back through one writer.

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::core::BridgeState;
use crate::ws::protocol::{self, OutboundMessage, Welcome};

const REPLY_BUFFER: usize = 32;

pub fn router() -> Router<BridgeState> {
    Router::new().route("/ws", get(upgrade))
}

async fn upgrade(ws: WebSocketUpgrade, State(state): State<BridgeState>) -> Response {
    ws.on_upgrade(move |socket| session(socket, state))
}

async fn session(socket: WebSocket, state: BridgeState) {
    let _guard = state.track_ws_client();
    let client_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(client_id = %client_id, clients = state.ws_clients(), "WebSocket client connected");

    let (mut sink, mut stream) = socket.split();
    let (reply_tx, mut reply_rx) = mpsc::channel::<String>(REPLY_BUFFER);

    let welcome = OutboundMessage::Welcome(Welcome::new(&client_id)).to_json();
    if sink.send(Message::Text(welcome.into())).await.is_err() {
        return;
    }

    let writer = tokio::spawn(async move {
        while let Some(reply) = reply_rx.recv().await {
            if sink.send(Message::Text(reply.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let dispatcher = state.dispatcher.clone();
                let reply_tx = reply_tx.clone();
                let text = text.as_str().to_owned();
                tokio::spawn(async move {
                    let reply = protocol::handle_text(&dispatcher, &text).await;
                    let _ = reply_tx.send(reply.to_json()).await;
                });
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                tracing::warn!(client_id = %client_id, "WebSocket error: {e}");
                break;
            }
            _ => {} // axum answers pings itself
        }
    }

    drop(reply_tx);
    writer.abort();
    tracing::info!(client_id = %client_id, "WebSocket client disconnected");
}
