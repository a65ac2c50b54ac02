use std::time::Duration;

use futures::{SinkExt, StreamExt};
use print_bridge::{BridgeState, Config, PrintClient, api};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(5);

async fn state(dir: &std::path::Path) -> BridgeState {
    BridgeState::initialize(&Config::for_spool_dir(dir, &["Kitchen", "Bar"])).await
}

/// Serve the router on an ephemeral port
async fn serve(state: BridgeState) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, api::app(state)).await.unwrap();
    });
    addr
}

async fn next_json<S>(stream: &mut S) -> Value
where
    S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let msg = tokio::time::timeout(WAIT, stream.next())
            .await
            .expect("timed out waiting for a message")
            .expect("stream ended")
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn wait_for_clients(state: &BridgeState, expected: usize) {
    tokio::time::timeout(WAIT, async {
        while state.ws_clients() != expected {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("client count never settled");
}

#[tokio::test]
async fn test_ws_endpoint_welcomes_and_answers() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path()).await;
    let addr = serve(state.clone()).await;

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", addr))
        .await
        .unwrap();

    let welcome = next_json(&mut ws).await;
    assert_eq!(welcome["type"], "welcome");
    assert!(!welcome["clientId"].as_str().unwrap().is_empty());
    wait_for_clients(&state, 1).await;

    ws.send(Message::Text(json!({"type": "getPrinters"}).to_string().into()))
        .await
        .unwrap();
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["type"], "getPrinters");
    assert_eq!(reply["success"], true);
    assert_eq!(reply["data"]["count"], 2);
    assert_eq!(reply["data"]["defaultPrinter"], "Kitchen");

    ws.send(Message::Text(
        json!({"type": "print", "content": "table 4", "printer": "Bar"})
            .to_string()
            .into(),
    ))
    .await
    .unwrap();
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["type"], "print");
    assert_eq!(reply["success"], true);
    assert_eq!(reply["data"]["printer"], "Bar");

    ws.close(None).await.unwrap();
    wait_for_clients(&state, 0).await;
}

#[tokio::test]
async fn test_api_status_counts_open_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path()).await;
    let addr = serve(state.clone()).await;

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", addr))
        .await
        .unwrap();
    next_json(&mut ws).await;
    wait_for_clients(&state, 1).await;

    let status = status_over_http(addr).await;
    assert_eq!(status["status"], "running");
    assert_eq!(status["clients"], 1);

    drop(ws);
    wait_for_clients(&state, 0).await;
    assert_eq!(status_over_http(addr).await["clients"], 0);
}

/// Minimal HTTP/1.0 GET, enough for a JSON status body
async fn status_over_http(addr: std::net::SocketAddr) -> Value {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /api/status HTTP/1.0\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();
    let body = raw.split("\r\n\r\n").nth(1).unwrap();
    serde_json::from_str(body).unwrap()
}

#[tokio::test]
async fn test_print_client_answers_and_reconnects() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path()).await;

    let relay = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", relay.local_addr().unwrap());

    let shutdown = CancellationToken::new();
    let client = PrintClient::new(
        url,
        Duration::from_millis(100),
        state.dispatcher.clone(),
        shutdown.clone(),
    );
    let client_task = tokio::spawn(client.run());

    // First session: ask for printers, then hang up
    let (stream, _) = tokio::time::timeout(WAIT, relay.accept()).await.unwrap().unwrap();
    let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
    ws.send(Message::Text(json!({"type": "getPrinters"}).to_string().into()))
        .await
        .unwrap();
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["type"], "getPrinters");
    assert_eq!(reply["data"]["count"], 2);
    ws.close(None).await.unwrap();
    drop(ws);

    // The client comes back after its reconnect delay
    let (stream, _) = tokio::time::timeout(WAIT, relay.accept())
        .await
        .expect("client did not reconnect")
        .unwrap();
    let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
    ws.send(Message::Text(
        json!({"type": "printTest", "printer": "Bar"}).to_string().into(),
    ))
    .await
    .unwrap();
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["type"], "printTest");
    assert_eq!(reply["success"], true);
    assert_eq!(reply["data"]["message"], "Test page sent to Bar");

    ws.send(Message::Text("not json".into())).await.unwrap();
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["type"], "error");

    shutdown.cancel();
    tokio::time::timeout(WAIT, client_task)
        .await
        .expect("client did not stop on shutdown")
        .unwrap();
}
