use crate::connection::ConnectionState;
use crate::connection::ConnectionState::*;

const ALL: [ConnectionState; 5] = [Disconnected, Connecting, Connected, Reconnecting, Errored];

/// **VALUE**: Only `Connected` may send.
///
/// **WHY THIS MATTERS**: Frames written while the socket is opening or closing are lost
/// or rejected by the transport.
///
/// **BUG THIS CATCHES**: Would catch `can_send` widening to `Connecting`.
#[test]
fn given_each_state_when_can_send_then_only_connected_is_true() {
    for state in ALL {
        assert_eq!(state.can_send(), state == Connected, "{state}");
    }
}

/// **VALUE**: The lifecycle graph has exactly the documented edges.
///
/// **WHY THIS MATTERS**: The connection task refuses illegal edges; a missing legal one
/// would strand the client in a state it cannot leave.
///
/// **BUG THIS CATCHES**: Would catch an edge added or removed without updating callers.
#[test]
fn given_state_pairs_when_checking_transitions_then_matches_lifecycle_graph() {
    let legal = [
        (Disconnected, Connecting),
        (Disconnected, Reconnecting),
        (Connecting, Connected),
        (Connecting, Errored),
        (Connecting, Reconnecting),
        (Connecting, Disconnected),
        (Connected, Disconnected),
        (Connected, Errored),
        (Reconnecting, Connecting),
        (Reconnecting, Disconnected),
        (Errored, Connecting),
        (Errored, Disconnected),
    ];

    for from in ALL {
        for to in ALL {
            let expected = legal.contains(&(from, to));
            assert_eq!(
                from.can_transition_to(to),
                expected,
                "{from} -> {to} should be {}",
                if expected { "legal" } else { "illegal" }
            );
        }
    }
}

/// **VALUE**: Every state can reach `Disconnected` in one step.
///
/// **WHY THIS MATTERS**: `disconnect()` must succeed from anywhere.
///
/// **BUG THIS CATCHES**: Would catch a state that can only leave through `Connecting`.
#[test]
fn given_any_non_disconnected_state_when_disconnecting_then_edge_is_legal() {
    for state in ALL.into_iter().filter(|s| *s != Disconnected) {
        assert!(state.can_transition_to(Disconnected), "{state}");
    }
    assert_eq!(ConnectionState::default(), Disconnected);
    assert_eq!(Reconnecting.to_string(), "reconnecting");
}
