//! Connection lifecycle.
//!
//! All mutation happens inside one task ([`actor`]) that owns the socket, the router,
//! the reconnection policy and the timers. The client handle only sends it commands and
//! reads published state.

pub(crate) mod actor;
pub mod reconnect;
pub mod state;
pub(crate) mod timers;
pub(crate) mod transport;

pub use reconnect::ReconnectPolicy;
pub use state::ConnectionState;
