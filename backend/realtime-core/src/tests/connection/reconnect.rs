use crate::connection::ReconnectPolicy;

use std::time::Duration;

/// **VALUE**: The policy yields exactly `max_attempts` fixed delays, then stops.
///
/// **WHY THIS MATTERS**: Unbounded retries against a dead backend drain battery and flood
/// logs; too few give up on a brief restart.
///
/// **BUG THIS CATCHES**: Would catch an off-by-one in the attempt bound or a growing delay.
#[test]
fn given_policy_when_attempts_exhausted_then_returns_none() {
    // GIVEN: Three attempts at 250ms
    let mut policy = ReconnectPolicy::new(Duration::from_millis(250), 3);

    // WHEN: Asking for delays until refused
    let delays: Vec<Duration> = std::iter::from_fn(|| policy.next_delay()).collect();

    // THEN: Three identical delays, then exhausted
    assert_eq!(delays, vec![Duration::from_millis(250); 3]);
    assert_eq!(policy.attempts(), 3);
    assert!(policy.is_exhausted());
    assert_eq!(policy.next_delay(), None);
    assert_eq!(policy.attempts(), 3, "refused attempts are not counted");
}

/// **VALUE**: `reset()` restores the full budget.
///
/// **WHY THIS MATTERS**: Each successful open starts a fresh reconnection lifecycle.
///
/// **BUG THIS CATCHES**: Would catch the counter surviving a successful reconnect.
#[test]
fn given_partially_used_policy_when_reset_then_counter_is_zero() {
    let mut policy = ReconnectPolicy::new(Duration::from_secs(3), 2);
    policy.next_delay();
    policy.next_delay();
    assert!(policy.is_exhausted());

    policy.reset();

    assert_eq!(policy.attempts(), 0);
    assert_eq!(policy.next_delay(), Some(Duration::from_secs(3)));
    assert_eq!(policy.interval(), Duration::from_secs(3));
    assert_eq!(policy.max_attempts(), 2);
}
