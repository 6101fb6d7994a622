//! Bounded, fixed-interval reconnection.

use std::fmt;
use std::time::Duration;

use backoff::backoff::{Backoff, Constant};
use log::{debug, warn};

/// Decides whether another reconnect attempt is allowed and how long to wait first.
///
/// The counter only goes up through [`next_delay`](Self::next_delay) and only returns to
/// zero on [`reset`](Self::reset), which the connection task calls after every successful
/// open and on explicit disconnect.
pub struct ReconnectPolicy {
    schedule: Constant,
    interval: Duration,
    max_attempts: u32,
    attempts: u32,
}

impl fmt::Debug for ReconnectPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconnectPolicy")
            .field("interval", &self.interval)
            .field("max_attempts", &self.max_attempts)
            .field("attempts", &self.attempts)
            .finish()
    }
}

impl ReconnectPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            schedule: Constant::new(interval),
            interval,
            max_attempts,
            attempts: 0,
        }
    }

    /// Count one more attempt and return the wait before it, or `None` once the bound is
    /// reached.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            warn!(
                "Reconnect budget exhausted after {} attempts",
                self.attempts
            );
            return None;
        }

        let delay = self.schedule.next_backoff()?;
        self.attempts += 1;
        debug!(
            "Reconnect attempt {}/{} in {delay:?}",
            self.attempts, self.max_attempts
        );
        Some(delay)
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
        self.schedule.reset();
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}
