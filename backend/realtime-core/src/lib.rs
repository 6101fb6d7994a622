//! Realtime client protocol layer for the recipe backend.
//!
//! One persistent WebSocket carries OCR progress/results and recommendation progress/results.
//! The crate is split leaf-first:
//!
//! - [`protocol`]: wire messages, the JSON codec and close-code classification
//! - [`connection`]: lifecycle states, reconnection policy and the actor that owns the socket
//! - [`dispatch`]: routes decoded frames to exactly one event, normalizing payloads
//! - [`events`]: typed events and the listener interface the application implements
//! - [`client`]: [`RealtimeClient`], the handle the application owns

pub mod client;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod protocol;

pub use client::RealtimeClient;
pub use config::{ClientConfig, ConnectionParams, ConnectionParamsBuilder};
pub use connection::ConnectionState;
pub use error::realtime::RealtimeError;
pub use events::{ChannelListener, ClientEvent, RealtimeListener};
pub use protocol::ClientRequest;

#[cfg(test)]
mod tests;

pub const DEFAULT_HOSTNAME: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_ENDPOINT: &str =
    const_format::concatcp!("ws://", DEFAULT_HOSTNAME, ":", DEFAULT_PORT);
