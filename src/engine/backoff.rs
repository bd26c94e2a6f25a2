//! Backoff policy for rate-limited requests
//!
//! A pure decision function: given the current delay and the retries left,
//! either retry after the current delay (doubling it for next time) or
//! abort. The fetch session holds the state and resets it on success.

use std::time::Duration;

/// Default retry budget per run of consecutive 429s
pub const DEFAULT_RETRY_BUDGET: u32 = 5;

/// Default first wait after a 429
pub const DEFAULT_BACKOFF_FLOOR: Duration = Duration::from_secs(1);

/// Backoff configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    /// First wait, and the value the delay resets to after a success
    pub floor: Duration,
    /// Retries allowed before giving up, restored after a success
    pub retry_budget: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            floor: DEFAULT_BACKOFF_FLOOR,
            retry_budget: DEFAULT_RETRY_BUDGET,
        }
    }
}

impl BackoffConfig {
    /// Create a new backoff config
    pub fn new(floor: Duration, retry_budget: u32) -> Self {
        Self {
            floor,
            retry_budget,
        }
    }
}

/// What to do after a rate-limit response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Wait `wait`, then re-issue the same request
    Retry {
        /// How long to wait before the retry
        wait: Duration,
        /// Delay to use if the retry is rate limited too
        next_delay: Duration,
        /// Retries left after this one
        retries_remaining: u32,
    },
    /// Give up and keep what has been collected
    Abort,
}

impl Decision {
    /// Check if this is a retry decision
    pub fn is_retry(&self) -> bool {
        matches!(self, Self::Retry { .. })
    }
}

/// Exponential backoff with a bounded retry budget
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackoffPolicy {
    config: BackoffConfig,
}

impl BackoffPolicy {
    /// Create a new policy
    pub fn new(config: BackoffConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }

    /// Decide how to react to a 429
    pub fn on_rate_limited(&self, current_delay: Duration, retries_remaining: u32) -> Decision {
        if retries_remaining == 0 {
            return Decision::Abort;
        }

        Decision::Retry {
            wait: current_delay,
            next_delay: current_delay.saturating_mul(2),
            retries_remaining: retries_remaining - 1,
        }
    }
}
