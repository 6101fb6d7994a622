//! Socket plumbing: the connect task, the read loop and the close helper.
//!
//! None of these touch connection state. They report back to the connection task
//! through its inbox, tagged with the generation they were started in.

use crate::connection::actor::Inbox;
use crate::error::realtime::RealtimeError;
use crate::protocol::close_code::{ABNORMAL, NO_STATUS};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, trace};
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

const CLIENT_CLOSE_REASON: &str = "client closing";

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub(crate) type WsSink = SplitSink<WsStream, Message>;
pub(crate) type WsSource = SplitStream<WsStream>;

pub(crate) enum TransportEvent {
    Opened {
        generation: u64,
        stream: WsStream,
    },
    OpenFailed {
        generation: u64,
        message: String,
    },
    Frame {
        generation: u64,
        payload: Vec<u8>,
    },
    Closed {
        generation: u64,
        code: u16,
        reason: String,
    },
}

/// Open the socket in the background and report the outcome.
pub(crate) fn spawn_connect(
    url: Url,
    generation: u64,
    inbox: UnboundedSender<Inbox>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let event = match connect_async(url.as_str()).await {
            Ok((stream, response)) => {
                debug!("WebSocket handshake completed ({})", response.status());
                TransportEvent::Opened { generation, stream }
            }
            Err(e) => TransportEvent::OpenFailed {
                generation,
                message: format!("WebSocket handshake failed: {e}"),
            },
        };

        if inbox.send(Inbox::Transport(event)).is_err() {
            debug!("Connection task stopped before the handshake finished");
        }
    })
}

/// Forward inbound frames until the socket closes, then report exactly one `Closed`.
///
/// A read error or a stream that ends without a close frame is reported as 1006.
pub(crate) fn spawn_reader(
    mut source: WsSource,
    generation: u64,
    inbox: UnboundedSender<Inbox>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let (code, reason) = loop {
            let payload = match source.next().await {
                Some(Ok(Message::Text(text))) => text.as_str().as_bytes().to_vec(),
                Some(Ok(Message::Binary(bytes))) => bytes.to_vec(),
                Some(Ok(Message::Close(Some(frame)))) => {
                    break (u16::from(frame.code), frame.reason.as_str().to_string());
                }
                Some(Ok(Message::Close(None))) => break (NO_STATUS, String::new()),
                Some(Ok(_)) => continue,
                Some(Err(e)) => break (ABNORMAL, e.to_string()),
                None => break (ABNORMAL, String::from("stream ended without close frame")),
            };

            let frame = TransportEvent::Frame {
                generation,
                payload,
            };
            if inbox.send(Inbox::Transport(frame)).is_err() {
                trace!("Connection task stopped, reader exiting");
                return;
            }
        };

        let closed = TransportEvent::Closed {
            generation,
            code,
            reason,
        };
        if inbox.send(Inbox::Transport(closed)).is_err() {
            trace!("Connection task stopped before close could be reported");
        }
    })
}

pub(crate) async fn send_text(sink: &mut WsSink, text: String) -> Result<(), RealtimeError> {
    sink.send(Message::Text(text.into()))
        .await
        .map_err(|e| RealtimeError::transport(format!("Failed to send frame: {e}")))
}

/// Send a normal (1000) close in the background and drop the write half.
pub(crate) fn spawn_close(mut sink: WsSink) {
    tokio::spawn(async move {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: CLIENT_CLOSE_REASON.into(),
        };
        if let Err(e) = sink.send(Message::Close(Some(frame))).await {
            debug!("Close frame not delivered: {e}");
        }
        let _ = sink.close().await;
    });
}

/// Close a socket that opened after its connect attempt was superseded.
pub(crate) fn spawn_discard(mut stream: WsStream) {
    tokio::spawn(async move {
        if let Err(e) = stream.close(None).await {
            trace!("Superseded socket close failed: {e}");
        }
    });
}
