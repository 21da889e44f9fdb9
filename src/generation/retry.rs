//! Retry policy applied uniformly to every remote generation attempt.

use crate::config::RetryConfig;
use rand::Rng;
use std::time::Duration;

/// Attempt budget for one persona: how many tries, how long each may take,
/// and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Per-attempt deadline; the in-flight request is dropped when it expires.
    pub attempt_timeout: Duration,
    /// Fixed pause before each retry.
    pub backoff: Duration,
    /// Upper bound of uniform random jitter added to `backoff`.
    pub jitter: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;
    pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(18);
    pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(250);
    pub const DEFAULT_JITTER: Duration = Duration::from_millis(50);

    /// Whether another attempt is allowed after `attempts_made` failures.
    pub fn allows_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }

    /// Delay before the next attempt: `backoff` plus up to `jitter`.
    pub fn retry_delay(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.backoff;
        }
        self.backoff
            .saturating_add(Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms)))
    }

    /// Worst-case wall-clock budget for one persona. Saturates at
    /// `Duration::MAX`.
    pub fn persona_budget(&self) -> Duration {
        let retries = self.max_attempts.saturating_sub(1);
        let waits = self.backoff.saturating_add(self.jitter).saturating_mul(retries);
        self.attempt_timeout
            .saturating_mul(self.max_attempts)
            .saturating_add(waits)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            attempt_timeout: Self::DEFAULT_ATTEMPT_TIMEOUT,
            backoff: Self::DEFAULT_BACKOFF,
            jitter: Self::DEFAULT_JITTER,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            attempt_timeout: Duration::from_millis(config.attempt_timeout_ms),
            backoff: Duration::from_millis(config.backoff_ms),
            jitter: Duration::from_millis(config.jitter_ms),
        }
    }
}
