//! Dispatch router: one decoded frame in, at most one event out.
//!
//! The router is synchronous and owns no I/O. Anything that must touch the connection
//! (marking the credential rejected, scheduling the rate-limit close) comes back as a
//! [`RouteAction`] for the connection task to apply.

pub mod normalize;
pub mod triage;

use crate::error::realtime::RealtimeError;
use crate::events::{ClientEvent, ProgressSnapshot};
use crate::protocol::messages::{ErrorFrame, GenericError, ServerMessage};

use common::ErrorLocation;

use std::panic::Location;

use log::{debug, info, warn};

const DEFAULT_OCR_ERROR: &str = "Text extraction failed";
const DEFAULT_RECOMMENDATION_ERROR: &str = "Could not generate recommendations";
const DEFAULT_GENERAL_ERROR: &str = "Something went wrong";
const DEFAULT_TOKEN_EXPIRED: &str = "Session expired, please sign in again";
const DEFAULT_AUTH_REJECTED: &str = "Authentication rejected";

/// Side effect the connection task must perform after delivering the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    None,
    /// Credential rejected: move to `Errored`, suppress reconnection.
    RejectCredential,
    /// OCR throttled: close the socket after the configured delay, no reconnect.
    CloseForRateLimit,
}

#[derive(Debug, Clone)]
pub struct RouteOutcome {
    pub event: Option<ClientEvent>,
    pub action: RouteAction,
}

impl RouteOutcome {
    fn deliver(event: ClientEvent) -> Self {
        Self {
            event: Some(event),
            action: RouteAction::None,
        }
    }

    fn with_action(event: ClientEvent, action: RouteAction) -> Self {
        Self {
            event: Some(event),
            action,
        }
    }

    fn suppressed() -> Self {
        Self {
            event: None,
            action: RouteAction::None,
        }
    }
}

/// Maps server messages to events and tracks the two progress streams.
#[derive(Debug, Default)]
pub struct Router {
    progress: ProgressSnapshot,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn progress(&self) -> &ProgressSnapshot {
        &self.progress
    }

    /// Forget in-flight progress, e.g. when the connection goes away.
    pub fn reset(&mut self) {
        self.progress = ProgressSnapshot::default();
    }

    pub fn route(&mut self, message: ServerMessage) -> RouteOutcome {
        match message {
            ServerMessage::AuthResponse(response) if response.success => {
                info!("Realtime session authenticated");
                RouteOutcome::deliver(ClientEvent::Authenticated)
            }
            ServerMessage::AuthResponse(response) => {
                let reason = response
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_AUTH_REJECTED.to_string());
                warn!("Realtime authentication rejected: {reason}");
                RouteOutcome::with_action(
                    ClientEvent::TokenExpired(auth_error(reason)),
                    RouteAction::RejectCredential,
                )
            }
            ServerMessage::TokenExpired(expired) => {
                let reason = expired
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_TOKEN_EXPIRED.to_string());
                warn!("Realtime token expired: {reason}");
                RouteOutcome::with_action(
                    ClientEvent::TokenExpired(auth_error(reason)),
                    RouteAction::RejectCredential,
                )
            }
            ServerMessage::OcrProgress(frame) => {
                let merged =
                    normalize::merge_progress(self.progress.ocr.as_ref(), frame.into_fields());
                self.progress.ocr = Some(merged.clone());
                RouteOutcome::deliver(ClientEvent::OcrProgress(merged))
            }
            ServerMessage::OcrResult(result) => {
                self.progress.ocr = None;
                RouteOutcome::deliver(ClientEvent::OcrResult(result.data))
            }
            ServerMessage::OcrError(frame) => {
                self.progress.ocr = None;
                self.ocr_failure(message_or(frame, DEFAULT_OCR_ERROR))
            }
            ServerMessage::RecommendationProgress(frame) => {
                let merged = normalize::merge_progress(
                    self.progress.recommendation.as_ref(),
                    frame.into_fields(),
                );
                self.progress.recommendation = Some(merged.clone());
                RouteOutcome::deliver(ClientEvent::RecommendationProgress(merged))
            }
            ServerMessage::RecommendationResult(raw) => {
                self.progress.recommendation = None;
                let result = normalize::recommendation_result(raw);
                info!(
                    "Received {} recommended recipes (total {})",
                    result.recipes.len(),
                    result.total_count
                );
                RouteOutcome::deliver(ClientEvent::RecommendationResult(result))
            }
            ServerMessage::RecommendationError(frame) => {
                self.progress.recommendation = None;
                let message = message_or(frame, DEFAULT_RECOMMENDATION_ERROR);
                RouteOutcome::deliver(ClientEvent::RecommendationError(RealtimeError::server(
                    message,
                )))
            }
            ServerMessage::GeneralProgress(progress) => RouteOutcome::deliver(
                ClientEvent::GeneralProgress(normalize::general_progress(progress)),
            ),
            ServerMessage::GeneralError(frame) => {
                let message = message_or(frame, DEFAULT_GENERAL_ERROR);
                RouteOutcome::deliver(ClientEvent::GeneralError(RealtimeError::server(message)))
            }
            ServerMessage::Error(error) => self.triage_generic(error),
            ServerMessage::Unknown { kind } => {
                warn!("Ignoring realtime frame with unknown type '{kind}'");
                RouteOutcome::deliver(ClientEvent::UnknownMessage { kind })
            }
        }
    }

    fn ocr_failure(&mut self, message: String) -> RouteOutcome {
        if triage::is_rate_limited(&message) {
            warn!("OCR rate limited, connection will be closed: {message}");
            self.progress.ocr = None;
            return RouteOutcome::with_action(
                ClientEvent::OcrError(RealtimeError::RateLimit {
                    message,
                    location: ErrorLocation::from(Location::caller()),
                }),
                RouteAction::CloseForRateLimit,
            );
        }

        RouteOutcome::deliver(ClientEvent::OcrError(RealtimeError::server(message)))
    }

    fn triage_generic(&mut self, error: GenericError) -> RouteOutcome {
        let message = error
            .text()
            .unwrap_or_else(|| DEFAULT_GENERAL_ERROR.to_string());

        if triage::is_rate_limited(&message) {
            return self.ocr_failure(message);
        }

        if error
            .error_type
            .as_deref()
            .is_some_and(triage::is_credential_error_type)
        {
            warn!("Realtime credential rejected by error frame: {message}");
            return RouteOutcome::with_action(
                ClientEvent::TokenExpired(auth_error(message)),
                RouteAction::RejectCredential,
            );
        }

        if triage::is_internal(&message) {
            debug!("Suppressed internal realtime error: {message}");
            return RouteOutcome::suppressed();
        }

        RouteOutcome::deliver(ClientEvent::GeneralError(RealtimeError::server(message)))
    }
}

fn message_or(frame: ErrorFrame, fallback: &str) -> String {
    frame.into_text().unwrap_or_else(|| fallback.to_string())
}

#[track_caller]
fn auth_error(message: String) -> RealtimeError {
    RealtimeError::auth(message)
}
