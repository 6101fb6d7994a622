//! Typed events delivered to the application.
//!
//! Successful results and user-visible failures share this one channel; nothing crosses
//! the client boundary as a returned error except a failed `connect()`.

mod listener;

pub use listener::{ChannelListener, RealtimeListener};

use crate::connection::ConnectionState;
use crate::error::realtime::RealtimeError;

use std::fmt;

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub enum ClientEvent {
    StateChanged {
        from: ConnectionState,
        to: ConnectionState,
    },
    /// The backend accepted the `auth` frame.
    Authenticated,
    OcrProgress(ProgressInfo),
    OcrResult(Value),
    /// [`RealtimeError::RateLimit`] when throttled, otherwise [`RealtimeError::Server`].
    OcrError(RealtimeError),
    RecommendationProgress(ProgressInfo),
    RecommendationResult(RecommendationResult),
    RecommendationError(RealtimeError),
    GeneralProgress(GeneralProgressInfo),
    GeneralError(RealtimeError),
    /// Always [`RealtimeError::Auth`]. Refresh the credential and reconnect.
    TokenExpired(RealtimeError),
    /// Transport, decoding, transient-server and terminal reconnect failures.
    ConnectionError(RealtimeError),
    UnknownMessage {
        kind: String,
    },
}

impl ClientEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ClientEvent::StateChanged { .. } => EventKind::StateChanged,
            ClientEvent::Authenticated => EventKind::Authenticated,
            ClientEvent::OcrProgress(_) => EventKind::OcrProgress,
            ClientEvent::OcrResult(_) => EventKind::OcrResult,
            ClientEvent::OcrError(_) => EventKind::OcrError,
            ClientEvent::RecommendationProgress(_) => EventKind::RecommendationProgress,
            ClientEvent::RecommendationResult(_) => EventKind::RecommendationResult,
            ClientEvent::RecommendationError(_) => EventKind::RecommendationError,
            ClientEvent::GeneralProgress(_) => EventKind::GeneralProgress,
            ClientEvent::GeneralError(_) => EventKind::GeneralError,
            ClientEvent::TokenExpired(_) => EventKind::TokenExpired,
            ClientEvent::ConnectionError(_) => EventKind::ConnectionError,
            ClientEvent::UnknownMessage { .. } => EventKind::UnknownMessage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    StateChanged,
    Authenticated,
    OcrProgress,
    OcrResult,
    OcrError,
    RecommendationProgress,
    RecommendationResult,
    RecommendationError,
    GeneralProgress,
    GeneralError,
    TokenExpired,
    ConnectionError,
    UnknownMessage,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::StateChanged => "state_changed",
            EventKind::Authenticated => "authenticated",
            EventKind::OcrProgress => "ocr_progress",
            EventKind::OcrResult => "ocr_result",
            EventKind::OcrError => "ocr_error",
            EventKind::RecommendationProgress => "recommendation_progress",
            EventKind::RecommendationResult => "recommendation_result",
            EventKind::RecommendationError => "recommendation_error",
            EventKind::GeneralProgress => "general_progress",
            EventKind::GeneralError => "general_error",
            EventKind::TokenExpired => "token_expired",
            EventKind::ConnectionError => "connection_error",
            EventKind::UnknownMessage => "unknown_message",
        };
        f.write_str(name)
    }
}

/// Step-based progress of one long-running operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressInfo {
    pub current_step: u32,
    pub total_steps: u32,
    /// 0.0..=100.0
    pub percentage: f64,
    pub step_description: String,
}

/// Progress tracks currently in flight. OCR and recommendation are independent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressSnapshot {
    pub ocr: Option<ProgressInfo>,
    pub recommendation: Option<ProgressInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeneralProgressInfo {
    pub percent: f64,
    pub message: String,
}

/// Normalized `recommendation_result`. Recipe order is the server's.
///
/// Serializable so the application can cache the last result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecommendationResult {
    pub recipes: Vec<RecipeSummary>,
    pub total_count: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecipeSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub difficulty: String,
    pub cook_time_minutes: u32,
    pub calories: u32,
    pub servings: u32,
    pub match_score: f64,
    pub match_percentage: u32,
    pub match_reasons: Vec<String>,
    pub ingredients: Vec<String>,
    pub tags: Vec<String>,
}
