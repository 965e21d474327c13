//! Connection health classification.
//!
//! Health is derived from consecutive request outcomes, never from a single
//! failure. [`next_health`] is the whole state machine.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// Default number of consecutive failures before the connection is unhealthy.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Coarse connectivity state shown in the header badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionHealth {
    /// No request has completed yet.
    Connecting,
    Healthy,
    /// The API answers but reports a problem.
    Degraded,
    /// Consecutive failures reached the retry limit.
    Unhealthy,
    /// Polling has been shut down.
    Disconnected,
}

impl ConnectionHealth {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionHealth::Connecting => "connecting",
            ConnectionHealth::Healthy => "healthy",
            ConnectionHealth::Degraded => "degraded",
            ConnectionHealth::Unhealthy => "unhealthy",
            ConnectionHealth::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for ConnectionHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the latest poll told us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollSignal {
    /// A data endpoint answered with a valid response.
    Reachable,
    /// The health endpoint reported the bot as healthy.
    Healthy,
    /// The health endpoint answered but reported a problem.
    Degraded,
    /// The request failed.
    Failed,
}

/// Compute the next health state.
///
/// `failures` is the retry counter after the outcome has been recorded. Only
/// the health endpoint can clear `Degraded`; data endpoints answering while
/// degraded leave it in place.
pub fn next_health(
    current: ConnectionHealth,
    failures: u32,
    max_retries: u32,
    signal: PollSignal,
) -> ConnectionHealth {
    match signal {
        PollSignal::Reachable if current == ConnectionHealth::Degraded => current,
        PollSignal::Reachable | PollSignal::Healthy => ConnectionHealth::Healthy,
        PollSignal::Degraded => ConnectionHealth::Degraded,
        PollSignal::Failed if failures >= max_retries => ConnectionHealth::Unhealthy,
        PollSignal::Failed => current,
    }
}

/// Shared count of consecutive failed requests.
///
/// Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct RetryCounter {
    count: Arc<AtomicU32>,
}

impl RetryCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure and return the new count.
    pub fn increment(&self) -> u32 {
        self.count.fetch_add(1, Ordering::SeqCst).saturating_add(1)
    }

    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }

    pub fn get(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failures_below_limit_keep_state() {
        for start in [
            ConnectionHealth::Connecting,
            ConnectionHealth::Healthy,
            ConnectionHealth::Degraded,
        ] {
            for failures in 1..DEFAULT_MAX_RETRIES {
                assert_eq!(
                    next_health(start, failures, DEFAULT_MAX_RETRIES, PollSignal::Failed),
                    start
                );
            }
        }
    }

    #[test]
    fn test_failures_at_limit_are_unhealthy() {
        let counter = RetryCounter::new();
        let mut health = ConnectionHealth::Healthy;
        for _ in 0..DEFAULT_MAX_RETRIES {
            let failures = counter.increment();
            health = next_health(health, failures, DEFAULT_MAX_RETRIES, PollSignal::Failed);
        }
        assert_eq!(health, ConnectionHealth::Unhealthy);

        counter.reset();
        health = next_health(health, counter.get(), DEFAULT_MAX_RETRIES, PollSignal::Reachable);
        assert_eq!(health, ConnectionHealth::Healthy);
    }

    #[test]
    fn test_degraded_is_cleared_by_health_endpoint_only() {
        let degraded = next_health(ConnectionHealth::Healthy, 0, 3, PollSignal::Degraded);
        assert_eq!(degraded, ConnectionHealth::Degraded);
        assert_eq!(
            next_health(degraded, 0, 3, PollSignal::Reachable),
            ConnectionHealth::Degraded
        );
        assert_eq!(
            next_health(degraded, 0, 3, PollSignal::Healthy),
            ConnectionHealth::Healthy
        );
    }

    #[test]
    fn test_first_response_leaves_connecting() {
        assert_eq!(
            next_health(ConnectionHealth::Connecting, 0, 3, PollSignal::Reachable),
            ConnectionHealth::Healthy
        );
    }

    #[test]
    fn test_counter_clones_share_state() {
        let a = RetryCounter::new();
        let b = a.clone();
        assert_eq!(a.increment(), 1);
        assert_eq!(b.increment(), 2);
        b.reset();
        assert_eq!(a.get(), 0);
    }
}
