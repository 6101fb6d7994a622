//! Wire protocol: one JSON object per WebSocket text frame, discriminated by `type`.

pub mod close_code;
pub mod codec;
pub mod messages;

pub use close_code::{CloseDisposition, classify_close_code};
pub use codec::{decode, encode};
pub use messages::{ClientMessage, ClientRequest, ServerMessage};
