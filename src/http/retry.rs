//! Retry policy
//!
//! The policy is a plain value handed to the client, so the bound on
//! attempts and the delay schedule can be inspected and tested on their own.

use std::time::Duration;

/// Bounded exponential retry schedule for transient failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first request
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Upper bound on any single delay
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt bound and default schedule
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Default::default()
        }
    }

    /// A policy that never retries
    pub fn no_retry() -> Self {
        Self::new(1)
    }

    /// Set the first delay and the cap on every delay
    #[must_use]
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Whether another attempt is allowed after `attempt` (0-based) failed
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt + 1 < self.max_attempts
    }

    /// Delay to wait after the 0-based `attempt` failed
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }

    /// Delay after a rate-limited response, honouring `Retry-After` up to the cap
    pub fn rate_limit_delay(&self, attempt: u32, retry_after_seconds: Option<u64>) -> Duration {
        retry_after_seconds
            .map_or_else(|| self.delay_for(attempt), Duration::from_secs)
            .min(self.max_backoff)
    }
}
