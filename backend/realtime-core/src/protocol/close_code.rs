//! Close-code policy.
//!
//! Every non-clean close observed from the server lands in exactly one bucket, and each
//! bucket produces exactly one caller-visible signal (or none, for a normal closure).

pub const NORMAL: u16 = 1000;
pub const NO_STATUS: u16 = 1005;
pub const ABNORMAL: u16 = 1006;
pub const POLICY_VIOLATION: u16 = 1008;
pub const INTERNAL_ERROR: u16 = 1011;
pub const SERVICE_RESTART: u16 = 1012;
pub const TRY_AGAIN_LATER: u16 = 1013;

/// Application code: the user id in the path is unknown to the backend.
pub const INVALID_USER: u16 = 4001;
/// Application code: the token in the query string was rejected.
pub const AUTH_FAILED: u16 = 4003;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDisposition {
    /// 1000. Silent transition to `Disconnected`.
    Normal,
    /// Credential problem: token-expired event, never reconnect.
    InvalidCredential,
    /// Server-side hiccup: error event, reconnect if enabled.
    Transient,
    /// Not in any known set.
    Unrecognized,
}

pub fn classify_close_code(code: u16) -> CloseDisposition {
    match code {
        NORMAL => CloseDisposition::Normal,
        POLICY_VIOLATION | INVALID_USER | AUTH_FAILED => CloseDisposition::InvalidCredential,
        ABNORMAL | INTERNAL_ERROR | SERVICE_RESTART | TRY_AGAIN_LATER => {
            CloseDisposition::Transient
        }
        _ => CloseDisposition::Unrecognized,
    }
}

/// Text shown to the user for a close that was not initiated by us.
pub fn user_message(code: u16) -> String {
    match code {
        ABNORMAL => String::from("Connection lost unexpectedly"),
        INTERNAL_ERROR => String::from("Server encountered an internal error"),
        SERVICE_RESTART => String::from("Server is restarting"),
        TRY_AGAIN_LATER => String::from("Server is overloaded, please try again later"),
        POLICY_VIOLATION | AUTH_FAILED => String::from("Session expired, please sign in again"),
        INVALID_USER => String::from("Unknown user, please sign in again"),
        other => format!("Connection closed (code {other})"),
    }
}
