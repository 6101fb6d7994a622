//! Cancellable one-shot timers feeding the connection task.
//!
//! A timer carries the generation it was armed in. Cancellation aborts the sleeping
//! task; a timer that already fired is still rejected by the generation check in the
//! connection task.

use crate::connection::actor::Inbox;

use std::time::Duration;

use log::trace;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::sleep as TokioSleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerKind {
    /// Post-open delay before the `auth` frame.
    Authenticate,
    /// Fixed backoff before the next reconnect attempt.
    Reconnect,
    /// Delay between an OCR rate-limit error and closing the socket.
    RateLimitClose,
}

#[derive(Debug, Default)]
pub(crate) struct Timers {
    pending: Vec<(TimerKind, JoinHandle<()>)>,
}

impl Timers {
    /// Arm `kind`, replacing any pending timer of the same kind.
    pub(crate) fn schedule(
        &mut self,
        kind: TimerKind,
        delay: Duration,
        generation: u64,
        inbox: &UnboundedSender<Inbox>,
    ) {
        self.cancel(kind);
        self.pending.retain(|(_, handle)| !handle.is_finished());

        let inbox = inbox.clone();
        let handle = tokio::spawn(async move {
            TokioSleep(delay).await;
            if inbox.send(Inbox::Timer { kind, generation }).is_err() {
                trace!("{kind:?} timer fired after connection task stopped");
            }
        });

        trace!("Armed {kind:?} timer for {delay:?} (generation {generation})");
        self.pending.push((kind, handle));
    }

    pub(crate) fn cancel(&mut self, kind: TimerKind) {
        self.pending.retain(|(pending_kind, handle)| {
            if *pending_kind == kind {
                handle.abort();
                false
            } else {
                true
            }
        });
    }

    pub(crate) fn cancel_all(&mut self) {
        for (kind, handle) in self.pending.drain(..) {
            trace!("Cancelling {kind:?} timer");
            handle.abort();
        }
    }
}
