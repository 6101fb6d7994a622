//! The application-facing handle.
//!
//! [`RealtimeClient`] owns the connection task. Every method is a thin message to that
//! task except the reads, which come from `watch` channels the task publishes to.
//!
//! # Ownership
//!
//! One client per signed-in session. Two live clients for the same user would hold two
//! sockets against the same identity, so a replacement must tear the old one down first:
//! use [`RealtimeClient::replace`] on the slot that holds it.

use crate::config::ConnectionParams;
use crate::connection::ConnectionState;
use crate::connection::actor::{Command, ConnectionActor, Inbox};
use crate::error::realtime::RealtimeError;
use crate::events::{ChannelListener, ClientEvent, ProgressSnapshot, RealtimeListener};
use crate::protocol::messages::ClientRequest;

use common::RedactedToken;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info, warn};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

pub struct RealtimeClient {
    inbox: mpsc::UnboundedSender<Inbox>,
    state_rx: watch::Receiver<ConnectionState>,
    progress_rx: watch::Receiver<ProgressSnapshot>,
    generation: Arc<AtomicU64>,
    actor: Option<JoinHandle<()>>,
}

impl RealtimeClient {
    /// Spawn the connection task. The client starts `Disconnected`.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::Client`] when called outside a tokio runtime.
    pub fn new(params: ConnectionParams) -> Result<Self, RealtimeError> {
        let runtime = Handle::try_current().map_err(|e| {
            RealtimeError::client(format!("RealtimeClient requires a tokio runtime: {e}"))
        })?;

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (progress_tx, progress_rx) = watch::channel(ProgressSnapshot::default());
        let generation = Arc::new(AtomicU64::new(0));

        info!(
            "Creating realtime client for user {} at {}",
            params.user_id(),
            params.endpoint()
        );

        let actor = ConnectionActor::new(
            params,
            state_tx,
            progress_tx,
            Arc::clone(&generation),
            inbox_tx.clone(),
        );
        let handle = runtime.spawn(actor.run(inbox_rx));

        Ok(Self {
            inbox: inbox_tx,
            state_rx,
            progress_rx,
            generation,
            actor: Some(handle),
        })
    }

    /// Tear down whatever client `slot` holds, then put a fresh one there.
    ///
    /// The previous client is fully disconnected before the new one exists.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::Client`] when called outside a tokio runtime. The slot is
    /// left empty in that case.
    pub async fn replace(
        slot: &mut Option<Self>,
        params: ConnectionParams,
    ) -> Result<&mut Self, RealtimeError> {
        if let Some(previous) = slot.take() {
            info!("Replacing existing realtime client");
            previous.shutdown().await;
        }

        Ok(slot.insert(Self::new(params)?))
    }

    /// Open the connection.
    ///
    /// Resolves once the socket is open, or immediately if it already is (or is opening).
    /// Authentication happens after this returns and is reported as
    /// [`ClientEvent::Authenticated`] or [`ClientEvent::TokenExpired`].
    ///
    /// # Errors
    ///
    /// - [`RealtimeError::Transport`] if the URL cannot be built or the handshake fails
    /// - [`RealtimeError::Client`] if `disconnect()` cancels the attempt or the connection
    ///   task is gone
    pub async fn connect(&self) -> Result<(), RealtimeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command(Command::Connect { reply: reply_tx })?;

        reply_rx
            .await
            .map_err(|_| RealtimeError::client("Connection task dropped the connect request"))?
    }

    /// Close the connection and stop reconnecting until the next `connect()`.
    ///
    /// Anything armed before this call (auth delay, reconnect wait, a handshake in flight)
    /// is invalidated immediately, before the connection task even sees the command.
    pub fn disconnect(&self) {
        self.invalidate();
        if self.command(Command::Disconnect).is_err() {
            debug!("disconnect() on a stopped client");
        }
    }

    /// Fire-and-forget. Dropped with a warning unless the connection is `Connected`.
    pub fn send(&self, request: ClientRequest) {
        if let Err(e) = self.command(Command::Send(request)) {
            warn!("Request not sent: {e}");
        }
    }

    pub fn request_ocr(&self, image_url: impl Into<String>) {
        self.send(ClientRequest::Ocr {
            image_url: image_url.into(),
        });
    }

    pub fn request_recommendations(&self) {
        self.send(ClientRequest::Recommendation);
    }

    /// Replace the credential.
    ///
    /// A live connection is cycled so the new token is presented: exactly one close and
    /// one new connection. A connection whose credential was rejected, by frame or by
    /// close code, is recovered the same way. A handshake in flight is restarted with the
    /// new token. Otherwise the token is just stored for the next attempt.
    pub fn update_token(&self, token: impl Into<RedactedToken>) {
        if let Err(e) = self.command(Command::UpdateToken(token.into())) {
            warn!("Token not updated: {e}");
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// A receiver that wakes on every state change.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Progress of the OCR and recommendation operations currently in flight.
    pub fn progress(&self) -> ProgressSnapshot {
        self.progress_rx.borrow().clone()
    }

    /// Route all events to `listener`, replacing any previous one.
    pub fn set_listener(&self, listener: Arc<dyn RealtimeListener>) {
        if let Err(e) = self.command(Command::SetListener(listener)) {
            warn!("Listener not registered: {e}");
        }
    }

    /// Install a [`ChannelListener`] and return its receiving end.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ClientEvent> {
        let (listener, rx) = ChannelListener::new();
        self.set_listener(Arc::new(listener));
        rx
    }

    /// Disconnect and wait for the connection task to finish.
    pub async fn shutdown(mut self) {
        self.invalidate();
        let _ = self.command(Command::Shutdown);

        if let Some(actor) = self.actor.take()
            && let Err(e) = actor.await
        {
            warn!("Realtime connection task ended abnormally: {e}");
        }
    }

    fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn command(&self, command: Command) -> Result<(), RealtimeError> {
        self.inbox
            .send(Inbox::Command(command))
            .map_err(|_| RealtimeError::client("Realtime connection task is not running"))
    }
}

impl Drop for RealtimeClient {
    fn drop(&mut self) {
        if self.actor.is_none() {
            return;
        }
        self.invalidate();
        if self.command(Command::Shutdown).is_err() {
            debug!("Realtime connection task already stopped");
        }
    }
}
