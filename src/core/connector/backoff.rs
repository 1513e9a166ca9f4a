//! Exponential backoff with jitter and a circuit breaker for reconnect
//! attempts, grounded in the reference `ReconnectingDataStream`'s backoff
//! and circuit-breaker fields.

use std::time::{Duration, Instant};

use rand::Rng;

const INITIAL_DELAY_MS: u64 = 500;
const MAX_DELAY_MS: u64 = 30_000;
const TRIP_AFTER_FAILURES: u32 = 8;
const COOLDOWN_MS: u64 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CircuitState {
    Closed,
    Open { until_millis: u64 },
}

/// Tracks reconnect delay and a circuit breaker across repeated connector
/// failures. `now_millis` is injected so tests don't depend on wall-clock
/// sleeps.
pub struct Backoff {
    current_delay_ms: u64,
    consecutive_failures: u32,
    circuit: CircuitState,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

impl Backoff {
    #[must_use]
    pub const fn new() -> Self {
        Self { current_delay_ms: INITIAL_DELAY_MS, consecutive_failures: 0, circuit: CircuitState::Closed }
    }

    /// Reset to the initial delay. Called on a successful `STREAMING`
    /// transition.
    pub fn reset(&mut self) {
        self.current_delay_ms = INITIAL_DELAY_MS;
        self.consecutive_failures = 0;
        self.circuit = CircuitState::Closed;
    }

    /// Record a failed connection attempt, doubling the next delay up to
    /// the ceiling and tripping the breaker after enough consecutive
    /// failures.
    pub fn record_failure(&mut self, now: Instant, epoch_millis: u64) {
        self.consecutive_failures += 1;
        self.current_delay_ms = (self.current_delay_ms * 2).min(MAX_DELAY_MS);
        if self.consecutive_failures >= TRIP_AFTER_FAILURES {
            self.circuit = CircuitState::Open { until_millis: epoch_millis + COOLDOWN_MS };
        }
        let _ = now;
    }

    /// The next delay to sleep before attempting to reconnect, with +/-20%
    /// jitter so a fleet of connectors doesn't reconnect in lockstep.
    #[must_use]
    pub fn next_delay(&self) -> Duration {
        let jitter_frac = rand::thread_rng().gen_range(-0.2..=0.2);
        let jittered = (self.current_delay_ms as f64) * (1.0 + jitter_frac);
        Duration::from_millis(jittered.max(0.0) as u64)
    }

    /// Whether the circuit currently allows a reconnect attempt.
    #[must_use]
    pub fn allows_connection(&self, epoch_millis: u64) -> bool {
        match self.circuit {
            CircuitState::Closed => true,
            CircuitState::Open { until_millis } => epoch_millis >= until_millis,
        }
    }

    #[must_use]
    pub const fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}
