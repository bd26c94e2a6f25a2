//! Engine types
//!
//! Session state, termination reasons and run statistics.

use super::backoff::BackoffConfig;
use crate::types::Record;
use std::fmt;
use std::time::Duration;

/// Mutable state of one fetch run
///
/// Owned by a single `fetch` call and dropped when it returns.
#[derive(Debug, Clone)]
pub struct FetchSession {
    /// Records collected so far, in arrival order
    pub collected: Vec<Record>,
    /// Hard cap on `collected`
    pub target_count: usize,
    /// Continuation token for the next request
    pub cursor: Option<String>,
    /// 429s seen since the last success
    pub consecutive_failures: u32,
    /// Wait before the next retry
    pub retry_delay: Duration,
    /// Retries left before aborting
    pub retries_remaining: u32,
}

impl FetchSession {
    /// Start a session with nothing collected
    pub fn new(target_count: usize, backoff: &BackoffConfig) -> Self {
        Self {
            collected: Vec::new(),
            target_count,
            cursor: None,
            consecutive_failures: 0,
            retry_delay: backoff.floor,
            retries_remaining: backoff.retry_budget,
        }
    }

    /// Records still needed to reach the cap
    pub fn remaining(&self) -> usize {
        self.target_count.saturating_sub(self.collected.len())
    }

    /// Check if the cap has been reached
    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    /// Append a page, keeping at most `remaining()` records
    ///
    /// Returns the number of records kept.
    pub fn append(&mut self, records: Vec<Record>) -> usize {
        let take = records.len().min(self.remaining());
        self.collected.extend(records.into_iter().take(take));
        take
    }

    /// Forget failure history after a successful request
    pub fn record_success(&mut self, backoff: &BackoffConfig) {
        self.consecutive_failures = 0;
        self.retry_delay = backoff.floor;
        self.retries_remaining = backoff.retry_budget;
    }
}

/// Why a fetch run stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// Collected exactly the target number of records
    CapReached,
    /// The API reported no further pages
    Exhausted,
    /// The caller cancelled the run
    Cancelled,
    /// Too many consecutive 429 responses
    RetryBudgetExhausted {
        /// Consecutive 429s including the one that caused the abort
        attempts: u32,
    },
    /// A request failed for a reason other than rate limiting
    TransportFailure {
        /// Description of the failure
        message: String,
    },
}

impl Termination {
    /// Check if the run ended on a failure worth warning about
    ///
    /// Records are returned either way.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::RetryBudgetExhausted { .. } | Self::TransportFailure { .. }
        )
    }

    /// Check if the run stopped on its own (cap or exhaustion)
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::CapReached | Self::Exhausted)
    }

    /// Check if the run was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapReached => write!(f, "target count reached"),
            Self::Exhausted => write!(f, "no further pages"),
            Self::Cancelled => write!(f, "cancelled by user"),
            Self::RetryBudgetExhausted { attempts } => {
                write!(f, "rate limited {attempts} times in a row, retry budget exhausted")
            }
            Self::TransportFailure { message } => write!(f, "request failed: {message}"),
        }
    }
}

/// Statistics from a fetch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// Requests issued, including retries
    pub requests: usize,
    /// Successful pages
    pub pages_fetched: usize,
    /// Records received before trimming to the cap
    pub records_received: usize,
    /// 429 responses seen
    pub rate_limit_hits: usize,
    /// Backoff waits that ran to completion
    pub backoff_waits: Vec<Duration>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl FetchStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Total time spent in backoff waits
    pub fn total_backoff(&self) -> Duration {
        self.backoff_waits.iter().sum()
    }
}

/// Result of a fetch run: the records plus how and why it ended
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Collected records, never more than the target count
    pub records: Vec<Record>,
    /// Why the run stopped
    pub termination: Termination,
    /// Last known continuation token (`None` after exhaustion)
    pub last_cursor: Option<String>,
    /// Run statistics
    pub stats: FetchStats,
}

impl FetchOutcome {
    /// Number of collected records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if nothing was collected
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
