use std::fmt;

/// Lifecycle of the single realtime connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Errored,
}

impl ConnectionState {
    /// Only `Connected` may put frames on the wire.
    pub fn can_send(self) -> bool {
        self == ConnectionState::Connected
    }

    /// Whether `self -> next` is a legal edge.
    ///
    /// Staying in the same state is not a transition and returns false.
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;

        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Disconnected, Reconnecting)
                | (Connecting, Connected)
                | (Connecting, Errored)
                | (Connecting, Reconnecting)
                | (Connecting, Disconnected)
                | (Connected, Disconnected)
                | (Connected, Errored)
                | (Reconnecting, Connecting)
                | (Reconnecting, Disconnected)
                | (Errored, Connecting)
                | (Errored, Disconnected)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Errored => "errored",
        };
        f.write_str(name)
    }
}
