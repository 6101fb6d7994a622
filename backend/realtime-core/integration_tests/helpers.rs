//! Test helpers for realtime client integration tests.
//!
//! A scripted WebSocket server on an ephemeral port: every accepted socket is handed to
//! the test together with the request URI, and the test drives it frame by frame.

use realtime_core::{ClientEvent, ConnectionParams, ConnectionState, RealtimeClient};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

pub const TEST_USER_ID: &str = "user-42";
pub const TEST_TOKEN: &str = "test-token-12345";

/// Upper bound for anything the test waits on.
pub const WAIT: Duration = Duration::from_secs(5);
/// Window in which something must NOT happen.
pub const QUIET: Duration = Duration::from_millis(400);

pub type ServerSocket = WebSocketStream<TcpStream>;

pub struct Accepted {
    /// Path and query of the upgrade request, e.g. `/ws/user-42?token=...`.
    pub uri: String,
    pub socket: ServerSocket,
}

pub struct ScriptedServer {
    pub endpoint: String,
    pub port: u16,
    accepted: mpsc::UnboundedReceiver<Accepted>,
    accept_loop: JoinHandle<()>,
}

impl ScriptedServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let port = listener.local_addr().unwrap().port();
        let (tx, accepted) = mpsc::unbounded_channel();

        let accept_loop = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let tx = tx.clone();
                tokio::spawn(async move {
                    if let Some(accepted) = upgrade(stream).await {
                        let _ = tx.send(accepted);
                    }
                });
            }
        });

        Self {
            endpoint: format!("http://127.0.0.1:{port}"),
            port,
            accepted,
            accept_loop,
        }
    }

    /// Wait for the next client connection.
    pub async fn accept(&mut self) -> Accepted {
        timeout(WAIT, self.accepted.recv())
            .await
            .expect("Timed out waiting for a client connection")
            .expect("Accept loop stopped")
    }

    /// Accept, read the auth frame and answer it with success.
    pub async fn accept_authenticated(&mut self) -> Accepted {
        let mut accepted = self.accept().await;
        let auth = recv_json(&mut accepted.socket).await;
        assert_eq!(auth["type"], "auth", "First frame must be auth, got {auth}");
        send_json(
            &mut accepted.socket,
            serde_json::json!({"type": "auth_response", "success": true}),
        )
        .await;
        accepted
    }

    /// Assert that no client connects within [`QUIET`].
    pub async fn assert_no_connection(&mut self) {
        if let Ok(Some(accepted)) = timeout(QUIET, self.accepted.recv()).await {
            panic!("Unexpected connection to {}", accepted.uri);
        }
    }

    /// Stop accepting and close the listener. Further connects are refused.
    pub async fn stop(&mut self) {
        self.accept_loop.abort();
        let _ = (&mut self.accept_loop).await;
    }
}

impl Drop for ScriptedServer {
    fn drop(&mut self) {
        self.accept_loop.abort();
    }
}

/// Complete the WebSocket handshake on a raw TCP stream, capturing the request URI.
pub async fn upgrade(stream: TcpStream) -> Option<Accepted> {
    let uri = Arc::new(Mutex::new(String::new()));
    let captured = Arc::clone(&uri);
    let callback = move |request: &Request, response: Response| {
        *captured.lock().unwrap() = request.uri().to_string();
        Ok::<Response, ErrorResponse>(response)
    };

    let socket = accept_hdr_async(stream, callback).await.ok()?;
    let uri = uri.lock().unwrap().clone();
    Some(Accepted { uri, socket })
}

/// Params tuned for tests: short delays, three reconnect attempts.
pub fn fast_params(endpoint: &str, token: &str) -> ConnectionParams {
    ConnectionParams::builder()
        .with_endpoint(endpoint)
        .with_user_id(TEST_USER_ID)
        .with_token(token)
        .with_reconnect_interval(Duration::from_millis(50))
        .with_max_reconnect_attempts(3)
        .with_auth_delay(Duration::from_millis(10))
        .with_rate_limit_close_delay(Duration::from_millis(50))
        .build()
        .expect("Failed to build test params")
}

/// Next text frame from the client as JSON.
pub async fn recv_json(socket: &mut ServerSocket) -> Value {
    loop {
        let message = timeout(WAIT, socket.next())
            .await
            .expect("Timed out waiting for a client frame")
            .expect("Client socket ended")
            .expect("Error receiving client frame");

        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).expect("Client sent invalid JSON");
        }
    }
}

pub async fn send_json(socket: &mut ServerSocket, value: Value) {
    send_text(socket, &value.to_string()).await;
}

pub async fn send_text(socket: &mut ServerSocket, text: &str) {
    socket
        .send(Message::Text(text.to_string().into()))
        .await
        .expect("Failed to send server frame");
}

pub async fn close_with(socket: &mut ServerSocket, code: u16) {
    let frame = CloseFrame {
        code: CloseCode::from(code),
        reason: "scripted".into(),
    };
    let _ = socket.close(Some(frame)).await;
}

/// Wait until the client closes this socket. Returns the close code it sent, if any.
pub async fn expect_client_close(socket: &mut ServerSocket) -> Option<u16> {
    loop {
        match timeout(WAIT, socket.next())
            .await
            .expect("Timed out waiting for the client to close")
        {
            Some(Ok(Message::Close(frame))) => return frame.map(|f| u16::from(f.code)),
            Some(Ok(_)) => continue,
            Some(Err(_)) | None => return None,
        }
    }
}

/// Skip events until one matches `predicate`.
pub async fn wait_for_event<F>(
    events: &mut mpsc::UnboundedReceiver<ClientEvent>,
    predicate: F,
) -> ClientEvent
where
    F: Fn(&ClientEvent) -> bool,
{
    timeout(WAIT, async {
        loop {
            let event = events.recv().await.expect("Event channel closed");
            if predicate(&event) {
                return event;
            }
        }
    })
    .await
    .expect("Timed out waiting for event")
}

/// Assert that no event matching `predicate` arrives within [`QUIET`].
pub async fn assert_no_event<F>(events: &mut mpsc::UnboundedReceiver<ClientEvent>, predicate: F)
where
    F: Fn(&ClientEvent) -> bool,
{
    let _ = timeout(QUIET, async {
        while let Some(event) = events.recv().await {
            if predicate(&event) {
                panic!("Unexpected event: {event:?}");
            }
        }
    })
    .await;
}

pub async fn wait_for_state(client: &RealtimeClient, state: ConnectionState) {
    let mut states = client.watch_state();
    timeout(WAIT, states.wait_for(|current| *current == state))
        .await
        .unwrap_or_else(|_| panic!("Timed out waiting for state {state}, now {}", client.state()))
        .expect("State channel closed");
}

/// Connected client with a subscribed event receiver and the server side of its socket,
/// already authenticated.
pub async fn connected_client(
    server: &mut ScriptedServer,
    params: ConnectionParams,
) -> (RealtimeClient, mpsc::UnboundedReceiver<ClientEvent>, Accepted) {
    let client = RealtimeClient::new(params).expect("Failed to create client");
    let mut events = client.subscribe();

    client.connect().await.expect("connect() should succeed");
    let accepted = server.accept_authenticated().await;
    wait_for_event(&mut events, |e| matches!(e, ClientEvent::Authenticated)).await;

    (client, events, accepted)
}

/// [`connected_client`] with [`fast_params`] and the default test token.
pub async fn default_connected_client(
    server: &mut ScriptedServer,
) -> (RealtimeClient, mpsc::UnboundedReceiver<ClientEvent>, Accepted) {
    let params = fast_params(&server.endpoint, TEST_TOKEN);
    connected_client(server, params).await
}
