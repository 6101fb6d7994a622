use crate::connection::ConnectionState;
use crate::error::realtime::RealtimeError;
use crate::events::{ChannelListener, ClientEvent, EventKind, RealtimeListener};

use std::sync::Mutex;

#[derive(Default)]
struct AuthOnly {
    authenticated: Mutex<u32>,
    unhandled: Mutex<Vec<EventKind>>,
}

impl RealtimeListener for AuthOnly {
    fn on_authenticated(&self) {
        *self.authenticated.lock().unwrap() += 1;
    }

    fn on_unhandled(&self, kind: EventKind) {
        self.unhandled.lock().unwrap().push(kind);
    }
}

/// **VALUE**: Events without an override reach `on_unhandled` with their kind.
///
/// **WHY THIS MATTERS**: An application that forgets a handler should still see that the
/// event arrived.
///
/// **BUG THIS CATCHES**: Would catch a default method silently dropping its event.
#[test]
fn given_partial_listener_when_events_dispatched_then_rest_go_to_unhandled() {
    let listener = AuthOnly::default();

    listener.on_event(ClientEvent::Authenticated);
    listener.on_event(ClientEvent::StateChanged {
        from: ConnectionState::Connecting,
        to: ConnectionState::Connected,
    });
    listener.on_event(ClientEvent::TokenExpired(RealtimeError::auth("expired")));

    assert_eq!(*listener.authenticated.lock().unwrap(), 1);
    assert_eq!(
        *listener.unhandled.lock().unwrap(),
        vec![EventKind::StateChanged, EventKind::TokenExpired]
    );
}

/// **VALUE**: ChannelListener forwards events in order and survives a dropped receiver.
///
/// **BUG THIS CATCHES**: Would catch a panic when the application stops listening.
#[test]
fn given_channel_listener_when_events_sent_then_received_in_order() {
    let (listener, mut rx) = ChannelListener::new();

    listener.on_event(ClientEvent::Authenticated);
    listener.on_event(ClientEvent::UnknownMessage {
        kind: "x".to_string(),
    });

    assert!(matches!(rx.try_recv(), Ok(ClientEvent::Authenticated)));
    assert!(matches!(
        rx.try_recv(),
        Ok(ClientEvent::UnknownMessage { .. })
    ));

    drop(rx);
    listener.on_event(ClientEvent::Authenticated);
}

#[test]
fn given_event_kinds_when_displayed_then_snake_case() {
    assert_eq!(EventKind::RecommendationProgress.to_string(), "recommendation_progress");
    assert_eq!(EventKind::ConnectionError.to_string(), "connection_error");
}
