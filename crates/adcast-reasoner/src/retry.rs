//! Retry policy for the reasoning service.
//!
//! Delay before retry `n` (0-based) is `min(max_delay, base_delay * 2^n)` plus uniform
//! jitter. A rate-limit response that advertises `Retry-After` uses that wait instead of
//! the exponential term, still capped at `max_delay`.

use std::time::Duration;

use rand::Rng;

use crate::error::ReasoningError;

/// Default number of attempts per call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default base delay.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default cap on the backoff term.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

/// Bounded retry policy with capped exponential backoff and jitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. At least 1.
    pub max_attempts: u32,
    /// Delay before the first retry, doubled on each further retry.
    pub base_delay: Duration,
    /// Cap on the backoff term.
    pub max_delay: Duration,
    /// Jitter range added after a rate-limit response.
    pub rate_limit_jitter: (Duration, Duration),
    /// Jitter range added after any other transient failure.
    pub transient_jitter: (Duration, Duration),
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            rate_limit_jitter: (Duration::from_millis(200), Duration::from_millis(1_000)),
            transient_jitter: (Duration::from_millis(100), Duration::from_millis(800)),
        }
    }
}

impl RetryPolicy {
    /// A policy with no waiting between attempts.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            rate_limit_jitter: (Duration::ZERO, Duration::ZERO),
            transient_jitter: (Duration::ZERO, Duration::ZERO),
        }
    }

    /// Attempts to make, never less than one.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Whether `err` on attempt `attempt` (0-based) should be followed by another attempt.
    #[must_use]
    pub fn should_retry(&self, attempt: u32, err: &ReasoningError) -> bool {
        err.is_retryable() && attempt + 1 < self.attempts()
    }

    /// Backoff term for retry `attempt` (0-based), before jitter.
    #[must_use]
    pub fn backoff(&self, attempt: u32, err: &ReasoningError) -> Duration {
        let exponential = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt.min(31)));

        let wait = match err {
            ReasoningError::RateLimited {
                retry_after: Some(advertised),
            } => *advertised,
            _ => exponential,
        };

        wait.min(self.max_delay)
    }

    /// Full delay for retry `attempt` (0-based): backoff plus jitter drawn from `rng`.
    #[must_use]
    pub fn delay<R: Rng>(&self, attempt: u32, err: &ReasoningError, rng: &mut R) -> Duration {
        let (low, high) = if err.is_rate_limit() {
            self.rate_limit_jitter
        } else {
            self.transient_jitter
        };

        let jitter = if high > low {
            Duration::from_secs_f64(rng.gen_range(low.as_secs_f64()..high.as_secs_f64()))
        } else {
            low
        };

        self.backoff(attempt, err) + jitter
    }
}
