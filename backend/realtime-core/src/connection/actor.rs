//! The connection task.
//!
//! Owns the state machine and everything it mutates. Facade commands, transport events
//! and timer expiries all arrive through one inbox and are handled strictly in order,
//! so no two transitions ever overlap.
//!
//! # Generations
//!
//! Every connect attempt and every disconnect bumps a shared generation counter
//! (disconnect bumps it synchronously on the caller's side too). Socket and timer
//! events carry the generation they were started in and are dropped when it no
//! longer matches, so nothing armed before a disconnect can act after it.

use crate::config::ConnectionParams;
use crate::connection::reconnect::ReconnectPolicy;
use crate::connection::state::ConnectionState;
use crate::connection::timers::{TimerKind, Timers};
use crate::connection::transport::{self, TransportEvent, WsSink};
use crate::dispatch::{RouteAction, Router};
use crate::error::realtime::RealtimeError;
use crate::events::{ClientEvent, ProgressSnapshot, RealtimeListener};
use crate::protocol::close_code::{self, CloseDisposition};
use crate::protocol::messages::{ClientMessage, ClientRequest};
use crate::protocol::codec;

use common::{ErrorLocation, RedactedToken};

use std::panic::Location;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::StreamExt;
use log::{debug, error, info, trace, warn};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

pub(crate) type ConnectReply = oneshot::Sender<Result<(), RealtimeError>>;

/// Requests from the client handle.
pub(crate) enum Command {
    Connect { reply: ConnectReply },
    Disconnect,
    Send(ClientRequest),
    UpdateToken(RedactedToken),
    SetListener(Arc<dyn RealtimeListener>),
    Shutdown,
}

pub(crate) enum Inbox {
    Command(Command),
    Transport(TransportEvent),
    Timer { kind: TimerKind, generation: u64 },
}

pub(crate) struct ConnectionActor {
    params: ConnectionParams,
    /// Effective flag; forced off by `disconnect()`, restored by `connect()`.
    auto_reconnect: bool,
    state: ConnectionState,
    state_tx: watch::Sender<ConnectionState>,
    progress_tx: watch::Sender<ProgressSnapshot>,
    generation: Arc<AtomicU64>,
    inbox: mpsc::UnboundedSender<Inbox>,
    sink: Option<WsSink>,
    connector: Option<JoinHandle<()>>,
    reader: Option<JoinHandle<()>>,
    timers: Timers,
    policy: ReconnectPolicy,
    router: Router,
    listener: Option<Arc<dyn RealtimeListener>>,
    pending_connects: Vec<ConnectReply>,
    /// The in-flight connect attempt was started by the reconnection policy.
    reconnecting: bool,
    /// The backend rejected the credential; the coming close must not reconnect.
    credential_rejected: bool,
}

impl ConnectionActor {
    pub(crate) fn new(
        params: ConnectionParams,
        state_tx: watch::Sender<ConnectionState>,
        progress_tx: watch::Sender<ProgressSnapshot>,
        generation: Arc<AtomicU64>,
        inbox: mpsc::UnboundedSender<Inbox>,
    ) -> Self {
        let policy =
            ReconnectPolicy::new(params.reconnect_interval(), params.max_reconnect_attempts());

        Self {
            auto_reconnect: params.auto_reconnect(),
            params,
            state: ConnectionState::Disconnected,
            state_tx,
            progress_tx,
            generation,
            inbox,
            sink: None,
            connector: None,
            reader: None,
            timers: Timers::default(),
            policy,
            router: Router::new(),
            listener: None,
            pending_connects: Vec::new(),
            reconnecting: false,
            credential_rejected: false,
        }
    }

    pub(crate) async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Inbox>) {
        info!(
            "Realtime connection task started for user {}",
            self.params.user_id()
        );

        while let Some(message) = inbox.recv().await {
            let keep_running = match message {
                Inbox::Command(command) => self.handle_command(command).await,
                Inbox::Transport(event) => {
                    self.handle_transport(event);
                    true
                }
                Inbox::Timer { kind, generation } => {
                    self.handle_timer(kind, generation).await;
                    true
                }
            };

            if !keep_running {
                break;
            }
        }

        self.disconnect();
        info!("Realtime connection task stopped");
    }

    // ============================================
    // COMMANDS
    // ============================================

    async fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Connect { reply } => self.connect(reply),
            Command::Disconnect => self.disconnect(),
            Command::Send(request) => self.send_request(request).await,
            Command::UpdateToken(token) => self.update_token(token),
            Command::SetListener(listener) => {
                debug!("Realtime listener registered");
                self.listener = Some(listener);
            }
            Command::Shutdown => return false,
        }
        true
    }

    fn connect(&mut self, reply: ConnectReply) {
        if matches!(
            self.state,
            ConnectionState::Connected | ConnectionState::Connecting
        ) {
            debug!("connect() ignored, connection is already {}", self.state);
            let _ = reply.send(Ok(()));
            return;
        }

        self.auto_reconnect = self.params.auto_reconnect();
        self.reconnecting = false;
        self.credential_rejected = false;
        self.pending_connects.push(reply);
        self.start_connect();
    }

    fn disconnect(&mut self) {
        self.bump_generation();
        self.auto_reconnect = false;
        self.reconnecting = false;
        self.credential_rejected = false;
        self.release_transport();
        self.policy.reset();
        self.clear_progress();
        self.set_state(ConnectionState::Disconnected);
        self.resolve_pending(Err(RealtimeError::client(
            "Connection attempt cancelled by disconnect",
        )));
    }

    async fn send_request(&mut self, request: ClientRequest) {
        if !self.state.can_send() {
            warn!(
                "Dropping {} request: connection is {}",
                ClientMessage::from(request).kind(),
                self.state
            );
            return;
        }
        self.send_message(request.into()).await;
    }

    /// Store the token and make sure the next handshake and auth frame both use it.
    ///
    /// A live socket, or one parked after the backend rejected the credential (by frame
    /// or by close code), is cycled once. An in-flight handshake is restarted because its
    /// URL already carries the old token. A pending reconnect picks the token up when it
    /// fires; an idle client just stores it.
    fn update_token(&mut self, token: RedactedToken) {
        self.params.set_token(token);
        info!("Realtime token replaced");

        match self.state {
            ConnectionState::Connected => {}
            ConnectionState::Connecting => {
                info!("Restarting realtime handshake with the new token");
                self.start_connect();
                return;
            }
            ConnectionState::Errored | ConnectionState::Disconnected
                if self.credential_rejected => {}
            _ => return,
        }

        info!("Cycling realtime connection to apply the new token");
        self.bump_generation();
        self.release_transport();
        self.clear_progress();
        self.set_state(ConnectionState::Disconnected);

        self.reconnecting = false;
        self.credential_rejected = false;
        self.start_connect();
    }

    // ============================================
    // TRANSPORT
    // ============================================

    fn handle_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Opened { generation, stream } => {
                if !self.is_current(generation) || self.state != ConnectionState::Connecting {
                    debug!("Discarding socket from superseded attempt {generation}");
                    transport::spawn_discard(stream);
                    return;
                }
                self.on_opened(generation, stream);
            }
            TransportEvent::OpenFailed {
                generation,
                message,
            } => {
                if !self.is_current(generation) {
                    trace!("Ignoring failure of superseded attempt {generation}");
                    return;
                }
                self.on_open_failed(message);
            }
            TransportEvent::Frame {
                generation,
                payload,
            } => {
                if !self.is_current(generation) {
                    trace!("Ignoring frame from superseded socket {generation}");
                    return;
                }
                self.on_frame(&payload);
            }
            TransportEvent::Closed {
                generation,
                code,
                reason,
            } => {
                if !self.is_current(generation) {
                    trace!("Ignoring close of superseded socket {generation}");
                    return;
                }
                self.on_closed(code, &reason);
            }
        }
    }

    fn on_opened(&mut self, generation: u64, stream: transport::WsStream) {
        self.connector = None;

        let (sink, source) = stream.split();
        self.sink = Some(sink);
        self.reader = Some(transport::spawn_reader(
            source,
            generation,
            self.inbox.clone(),
        ));

        self.policy.reset();
        self.reconnecting = false;
        self.set_state(ConnectionState::Connected);

        // The backend may close right after accepting; auth only goes out if we are
        // still connected when this fires.
        self.timers.schedule(
            TimerKind::Authenticate,
            self.params.auth_delay(),
            generation,
            &self.inbox,
        );

        self.resolve_pending(Ok(()));
    }

    fn on_open_failed(&mut self, message: String) {
        self.connector = None;
        warn!("Realtime connection attempt failed: {message}");

        if self.reconnecting && self.auto_reconnect {
            self.schedule_reconnect();
            return;
        }

        let error = RealtimeError::transport(message);
        self.set_state(ConnectionState::Errored);
        self.emit(ClientEvent::ConnectionError(error.clone()));
        self.resolve_pending(Err(error));
    }

    fn on_frame(&mut self, payload: &[u8]) {
        let message = match codec::decode(payload) {
            Ok(message) => message,
            Err(e) => {
                warn!("Message parsing failed: {e}");
                self.emit(ClientEvent::ConnectionError(RealtimeError::Decoding {
                    message: format!("Message parsing failed: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                }));
                return;
            }
        };

        trace!("Received {} frame", message.kind());
        let outcome = self.router.route(message);
        self.publish_progress();

        if let Some(event) = outcome.event {
            self.emit(event);
        }

        match outcome.action {
            RouteAction::None => {}
            RouteAction::RejectCredential => {
                self.credential_rejected = true;
                self.timers.cancel(TimerKind::Authenticate);
                if self.state == ConnectionState::Connected {
                    self.set_state(ConnectionState::Errored);
                }
            }
            RouteAction::CloseForRateLimit => {
                let generation = self.current_generation();
                self.timers.schedule(
                    TimerKind::RateLimitClose,
                    self.params.rate_limit_close_delay(),
                    generation,
                    &self.inbox,
                );
            }
        }
    }

    fn on_closed(&mut self, code: u16, reason: &str) {
        self.reader = None;
        self.sink = None;
        self.timers.cancel(TimerKind::Authenticate);
        self.timers.cancel(TimerKind::RateLimitClose);
        self.clear_progress();

        if self.state == ConnectionState::Errored || self.credential_rejected {
            debug!("Socket closed after credential rejection (code {code})");
            return;
        }

        if self.state != ConnectionState::Connected {
            debug!("Socket closed while {} (code {code})", self.state);
            return;
        }

        info!("Realtime socket closed by server: code {code} '{reason}'");
        self.set_state(ConnectionState::Disconnected);

        match close_code::classify_close_code(code) {
            CloseDisposition::Normal => {}
            CloseDisposition::InvalidCredential => {
                self.credential_rejected = true;
                self.emit(ClientEvent::TokenExpired(RealtimeError::auth(
                    close_code::user_message(code),
                )));
            }
            CloseDisposition::Transient => {
                self.emit(ClientEvent::ConnectionError(transient_error(code)));
                if self.auto_reconnect {
                    self.schedule_reconnect();
                }
            }
            CloseDisposition::Unrecognized if self.auto_reconnect => {
                self.emit(ClientEvent::ConnectionError(transient_error(code)));
                self.schedule_reconnect();
            }
            CloseDisposition::Unrecognized => {
                self.emit(ClientEvent::ConnectionError(RealtimeError::transport(
                    close_code::user_message(code),
                )));
            }
        }
    }

    // ============================================
    // TIMERS
    // ============================================

    async fn handle_timer(&mut self, kind: TimerKind, generation: u64) {
        if !self.is_current(generation) {
            trace!("Dropping stale {kind:?} timer from generation {generation}");
            return;
        }

        match kind {
            TimerKind::Authenticate => {
                if self.state != ConnectionState::Connected {
                    debug!("Skipping auth: connection is {}", self.state);
                    return;
                }
                let token = self.params.token().clone();
                self.send_message(ClientMessage::Auth { token }).await;
            }
            TimerKind::Reconnect => {
                if self.state != ConnectionState::Reconnecting {
                    debug!("Skipping reconnect: connection is {}", self.state);
                    return;
                }
                info!(
                    "Reconnecting (attempt {}/{})",
                    self.policy.attempts(),
                    self.policy.max_attempts()
                );
                self.reconnecting = true;
                self.start_connect();
            }
            TimerKind::RateLimitClose => {
                info!("Closing realtime connection after OCR rate limit");
                self.bump_generation();
                self.reconnecting = false;
                self.release_transport();
                self.clear_progress();
                self.set_state(ConnectionState::Disconnected);
            }
        }
    }

    fn schedule_reconnect(&mut self) {
        match self.policy.next_delay() {
            Some(delay) => {
                let generation = self.current_generation();
                self.set_state(ConnectionState::Reconnecting);
                self.timers
                    .schedule(TimerKind::Reconnect, delay, generation, &self.inbox);
            }
            None => {
                let attempts = self.policy.attempts();
                self.reconnecting = false;
                self.set_state(ConnectionState::Disconnected);

                let error = RealtimeError::TerminalReconnectFailure {
                    message: format!("Could not reconnect after {attempts} attempts"),
                    attempts,
                    location: ErrorLocation::from(Location::caller()),
                };
                error!("{error}");
                self.emit(ClientEvent::ConnectionError(error.clone()));
                self.resolve_pending(Err(error));
            }
        }
    }

    // ============================================
    // HELPERS
    // ============================================

    fn start_connect(&mut self) {
        self.release_transport();
        let generation = self.bump_generation();
        self.set_state(ConnectionState::Connecting);

        match self.params.websocket_url() {
            Ok(url) => {
                info!("Connecting to {}", self.params.log_safe_url());
                self.connector = Some(transport::spawn_connect(
                    url,
                    generation,
                    self.inbox.clone(),
                ));
            }
            Err(e) => {
                error!("Cannot build realtime URL: {e}");
                let error = RealtimeError::transport(format!("Invalid realtime endpoint: {e}"));
                self.set_state(ConnectionState::Errored);
                self.emit(ClientEvent::ConnectionError(error.clone()));
                self.resolve_pending(Err(error));
            }
        }
    }

    async fn send_message(&mut self, message: ClientMessage) {
        let kind = message.kind();
        let text = match codec::encode(&message) {
            Ok(text) => text,
            Err(e) => {
                error!("{e}");
                self.emit(ClientEvent::ConnectionError(e.into()));
                return;
            }
        };

        let result = match self.sink.as_mut() {
            Some(sink) => transport::send_text(sink, text).await,
            None => Err(RealtimeError::transport(format!(
                "No open socket for {kind} frame"
            ))),
        };

        match result {
            Ok(()) => debug!("Sent {kind} frame"),
            Err(e) => {
                warn!("{e}");
                self.emit(ClientEvent::ConnectionError(e));
            }
        }
    }

    /// Stop everything tied to the current socket: timers, tasks, the socket itself.
    fn release_transport(&mut self) {
        self.timers.cancel_all();
        if let Some(connector) = self.connector.take() {
            connector.abort();
        }
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        if let Some(sink) = self.sink.take() {
            transport::spawn_close(sink);
        }
    }

    fn set_state(&mut self, next: ConnectionState) -> bool {
        let from = self.state;
        if from == next {
            return false;
        }
        if !from.can_transition_to(next) {
            warn!("Refusing illegal transition {from} -> {next}");
            return false;
        }

        info!("Realtime connection {from} -> {next}");
        self.state = next;
        self.state_tx.send_replace(next);
        self.emit(ClientEvent::StateChanged { from, to: next });
        true
    }

    fn emit(&self, event: ClientEvent) {
        match &self.listener {
            Some(listener) => listener.on_event(event),
            None => debug!("No listener registered, dropping {} event", event.kind()),
        }
    }

    fn resolve_pending(&mut self, result: Result<(), RealtimeError>) {
        for reply in self.pending_connects.drain(..) {
            let _ = reply.send(result.clone());
        }
    }

    fn clear_progress(&mut self) {
        self.router.reset();
        self.publish_progress();
    }

    fn publish_progress(&self) {
        self.progress_tx.send_replace(self.router.progress().clone());
    }

    fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.current_generation()
    }

    fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[track_caller]
fn transient_error(code: u16) -> RealtimeError {
    RealtimeError::TransientServer {
        message: close_code::user_message(code),
        close_code: code,
        location: ErrorLocation::caller(),
    }
}
