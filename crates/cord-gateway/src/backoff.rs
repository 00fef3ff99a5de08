//! Reconnection backoff
//!
//! Controls how long the engine sleeps between connection attempts. The
//! default is a randomized exponential backoff that resets after every
//! successful handshake.

use std::time::Duration;

use rand::Rng;

/// Strategy for spacing reconnection attempts.
pub trait Backoff: Send {
    /// The delay to sleep before the next attempt.
    fn next(&mut self) -> Duration;

    /// Called after a successful handshake so the next failure starts over
    /// from the initial interval.
    fn reset(&mut self);
}

/// Randomized exponential backoff.
///
/// Each attempt sleeps a uniformly random duration in
/// `interval ± interval * randomization`, then grows the interval by
/// `multiplier` up to `max_interval`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial_interval: Duration,
    max_interval: Duration,
    multiplier: f64,
    randomization: f64,
    current: Duration,
}

impl ExponentialBackoff {
    /// Create a backoff with explicit tuning.
    #[must_use]
    pub fn new(
        initial_interval: Duration,
        max_interval: Duration,
        multiplier: f64,
        randomization: f64,
    ) -> Self {
        Self {
            initial_interval,
            max_interval,
            multiplier,
            randomization,
            current: initial_interval,
        }
    }
}

impl Default for ExponentialBackoff {
    /// 500ms initial interval doubling up to 10s, with full randomization.
    fn default() -> Self {
        Self::new(
            Duration::from_millis(500),
            Duration::from_secs(10),
            2.0,
            1.0,
        )
    }
}

impl Backoff for ExponentialBackoff {
    fn next(&mut self) -> Duration {
        let interval = self.current.as_secs_f64();
        let delta = interval * self.randomization;
        let jittered = if delta > 0.0 {
            rand::thread_rng().gen_range(interval - delta..=interval + delta)
        } else {
            interval
        };

        let grown = interval * self.multiplier;
        self.current = if grown > self.max_interval.as_secs_f64() {
            self.max_interval
        } else {
            Duration::from_secs_f64(grown)
        };

        Duration::from_secs_f64(jittered.max(0.0))
    }

    fn reset(&mut self) {
        self.current = self.initial_interval;
    }
}
