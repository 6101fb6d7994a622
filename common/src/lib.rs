//! Shared building blocks for the realtime recipe client.
//!
//! ## Contents
//!
//! - [`ErrorLocation`]: call-site capture attached to every error in the workspace
//! - [`RedactedToken`]: bearer credential wrapper that never leaks into logs
//!
//! Nothing in here knows about WebSockets or the wire protocol; `realtime-core`
//! builds on these types.

pub mod error;
pub mod redacted_token;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use redacted_token::RedactedToken;
