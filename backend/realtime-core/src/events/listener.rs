use crate::connection::ConnectionState;
use crate::error::realtime::RealtimeError;
use crate::events::{
    ClientEvent, EventKind, GeneralProgressInfo, ProgressInfo, RecommendationResult,
};

use log::debug;
use serde_json::Value;
use tokio::sync::mpsc;

/// Observer for everything the connection reports.
///
/// One method per event kind. Each default forwards to [`on_unhandled`], so an
/// application only overrides what it cares about and still gets a diagnostic for the rest.
///
/// Methods run on the connection task: keep them short and hand heavy work off.
///
/// [`on_unhandled`]: RealtimeListener::on_unhandled
pub trait RealtimeListener: Send + Sync {
    /// Entry point used by the connection task.
    fn on_event(&self, event: ClientEvent) {
        match event {
            ClientEvent::StateChanged { from, to } => self.on_state_change(from, to),
            ClientEvent::Authenticated => self.on_authenticated(),
            ClientEvent::OcrProgress(progress) => self.on_ocr_progress(&progress),
            ClientEvent::OcrResult(data) => self.on_ocr_result(&data),
            ClientEvent::OcrError(error) => self.on_ocr_error(&error),
            ClientEvent::RecommendationProgress(progress) => {
                self.on_recommendation_progress(&progress)
            }
            ClientEvent::RecommendationResult(result) => self.on_recommendation_result(&result),
            ClientEvent::RecommendationError(error) => self.on_recommendation_error(&error),
            ClientEvent::GeneralProgress(progress) => self.on_general_progress(&progress),
            ClientEvent::GeneralError(error) => self.on_general_error(&error),
            ClientEvent::TokenExpired(error) => self.on_token_expired(&error),
            ClientEvent::ConnectionError(error) => self.on_connection_error(&error),
            ClientEvent::UnknownMessage { kind } => self.on_unknown_message(&kind),
        }
    }

    fn on_state_change(&self, _from: ConnectionState, _to: ConnectionState) {
        self.on_unhandled(EventKind::StateChanged);
    }

    fn on_authenticated(&self) {
        self.on_unhandled(EventKind::Authenticated);
    }

    fn on_ocr_progress(&self, _progress: &ProgressInfo) {
        self.on_unhandled(EventKind::OcrProgress);
    }

    fn on_ocr_result(&self, _data: &Value) {
        self.on_unhandled(EventKind::OcrResult);
    }

    fn on_ocr_error(&self, _error: &RealtimeError) {
        self.on_unhandled(EventKind::OcrError);
    }

    fn on_recommendation_progress(&self, _progress: &ProgressInfo) {
        self.on_unhandled(EventKind::RecommendationProgress);
    }

    fn on_recommendation_result(&self, _result: &RecommendationResult) {
        self.on_unhandled(EventKind::RecommendationResult);
    }

    fn on_recommendation_error(&self, _error: &RealtimeError) {
        self.on_unhandled(EventKind::RecommendationError);
    }

    fn on_general_progress(&self, _progress: &GeneralProgressInfo) {
        self.on_unhandled(EventKind::GeneralProgress);
    }

    fn on_general_error(&self, _error: &RealtimeError) {
        self.on_unhandled(EventKind::GeneralError);
    }

    fn on_token_expired(&self, _error: &RealtimeError) {
        self.on_unhandled(EventKind::TokenExpired);
    }

    fn on_connection_error(&self, _error: &RealtimeError) {
        self.on_unhandled(EventKind::ConnectionError);
    }

    fn on_unknown_message(&self, _kind: &str) {
        self.on_unhandled(EventKind::UnknownMessage);
    }

    fn on_unhandled(&self, kind: EventKind) {
        debug!("No listener handles {kind} events, dropping");
    }
}

/// Forwards every event into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<ClientEvent>,
}

impl ChannelListener {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ClientEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl RealtimeListener for ChannelListener {
    fn on_event(&self, event: ClientEvent) {
        if let Err(e) = self.tx.send(event) {
            debug!("Event receiver dropped, discarding {}", e.0.kind());
        }
    }
}
