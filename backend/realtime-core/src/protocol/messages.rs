use common::RedactedToken;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

// Inbound discriminants.
pub const AUTH_RESPONSE: &str = "auth_response";
pub const OCR_PROGRESS: &str = "ocr_progress";
pub const OCR_RESULT: &str = "ocr_result";
pub const OCR_ERROR: &str = "ocr_error";
pub const RECOMMENDATION_PROGRESS: &str = "recommendation_progress";
pub const RECOMMENDATION_RESULT: &str = "recommendation_result";
pub const RECOMMENDATION_ERROR: &str = "recommendation_error";
pub const TOKEN_EXPIRED: &str = "token_expired";
pub const GENERAL_PROGRESS: &str = "general_progress";
pub const GENERAL_ERROR: &str = "general_error";
pub const ERROR: &str = "error";

// ============================================
// OUTBOUND
// ============================================

/// Frames the client puts on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Auth {
        #[serde(serialize_with = "expose_token")]
        token: RedactedToken,
    },
    Ocr {
        image_url: String,
    },
    Recommendation,
}

impl ClientMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::Auth { .. } => "auth",
            ClientMessage::Ocr { .. } => "ocr",
            ClientMessage::Recommendation => "recommendation",
        }
    }
}

fn expose_token<S>(token: &RedactedToken, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(token.as_str())
}

/// Requests the application may send. Authentication is owned by the connection task,
/// so it is not representable here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientRequest {
    Ocr { image_url: String },
    Recommendation,
}

impl From<ClientRequest> for ClientMessage {
    fn from(request: ClientRequest) -> Self {
        match request {
            ClientRequest::Ocr { image_url } => ClientMessage::Ocr { image_url },
            ClientRequest::Recommendation => ClientMessage::Recommendation,
        }
    }
}

// ============================================
// INBOUND
// ============================================

/// A decoded server frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    AuthResponse(AuthResponse),
    OcrProgress(ProgressFrame),
    OcrResult(OcrResult),
    OcrError(ErrorFrame),
    RecommendationProgress(ProgressFrame),
    RecommendationResult(RawRecommendationResult),
    RecommendationError(ErrorFrame),
    GeneralProgress(GeneralProgress),
    GeneralError(ErrorFrame),
    TokenExpired(TokenExpired),
    Error(GenericError),
    /// Well-formed frame with a discriminant this client does not know.
    Unknown { kind: String },
}

impl ServerMessage {
    pub fn kind(&self) -> &str {
        match self {
            ServerMessage::AuthResponse(_) => AUTH_RESPONSE,
            ServerMessage::OcrProgress(_) => OCR_PROGRESS,
            ServerMessage::OcrResult(_) => OCR_RESULT,
            ServerMessage::OcrError(_) => OCR_ERROR,
            ServerMessage::RecommendationProgress(_) => RECOMMENDATION_PROGRESS,
            ServerMessage::RecommendationResult(_) => RECOMMENDATION_RESULT,
            ServerMessage::RecommendationError(_) => RECOMMENDATION_ERROR,
            ServerMessage::GeneralProgress(_) => GENERAL_PROGRESS,
            ServerMessage::GeneralError(_) => GENERAL_ERROR,
            ServerMessage::TokenExpired(_) => TOKEN_EXPIRED,
            ServerMessage::Error(_) => ERROR,
            ServerMessage::Unknown { kind } => kind,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Progress fields as they appear on the wire; every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WireProgress {
    #[serde(default, alias = "currentStep", alias = "step")]
    pub current_step: Option<u32>,
    #[serde(default, alias = "totalSteps")]
    pub total_steps: Option<u32>,
    #[serde(default, alias = "percent")]
    pub percentage: Option<f64>,
    #[serde(default, alias = "stepDescription", alias = "message")]
    pub step_description: Option<String>,
}

/// `ocr_progress` / `recommendation_progress`. The backend nests the fields under
/// `progress`; older builds put them on the frame itself.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProgressFrame {
    #[serde(default)]
    pub progress: Option<WireProgress>,
    #[serde(flatten)]
    pub inline: WireProgress,
}

impl ProgressFrame {
    pub fn into_fields(self) -> WireProgress {
        self.progress.unwrap_or(self.inline)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OcrResult {
    #[serde(default)]
    pub data: Value,
}

/// `ocr_error`, `recommendation_error` and `general_error`.
///
/// Backends put the text under `message`, `error` or `detail`, sometimes several at once,
/// so each is its own field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ErrorFrame {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ErrorFrame {
    /// First non-blank of `message`, `error`, `detail`.
    pub fn into_text(self) -> Option<String> {
        first_text([self.message, self.error, self.detail])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GeneralProgress {
    #[serde(default, alias = "percentage")]
    pub percent: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TokenExpired {
    #[serde(default)]
    pub message: Option<String>,
}

/// The catch-all `error` frame.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GenericError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default, alias = "errorType")]
    pub error_type: Option<String>,
}

impl GenericError {
    /// First non-blank of `message`, `error`, `detail`.
    pub fn text(&self) -> Option<String> {
        first_text([
            self.message.clone(),
            self.error.clone(),
            self.detail.clone(),
        ])
    }
}

fn first_text<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|text| !text.trim().is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawRecommendationResult {
    #[serde(default)]
    pub recipes: Option<Vec<RawRecipe>>,
    #[serde(default, alias = "totalCount")]
    pub total_count: Option<u32>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// A recipe exactly as the backend sent it. Numbers are read as `f64` so that a stray
/// fractional value does not fail the whole frame.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawRecipe {
    #[serde(default, alias = "recipe_id", alias = "recipeId")]
    pub id: Option<Value>,
    #[serde(default, alias = "name")]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "imageUrl", alias = "image")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default, alias = "cookTime", alias = "cooking_time")]
    pub cook_time: Option<f64>,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub servings: Option<f64>,
    #[serde(default, alias = "matchScore")]
    pub match_score: Option<f64>,
    #[serde(default, alias = "matchPercentage")]
    pub match_percentage: Option<f64>,
    #[serde(default, alias = "matchReasons")]
    pub match_reasons: Option<Vec<String>>,
    #[serde(default)]
    pub ingredients: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}
