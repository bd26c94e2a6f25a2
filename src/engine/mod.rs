//! Fetch engine module
//!
//! The paginated, rate-limited bulk fetch loop.
//!
//! # Overview
//!
//! - `FetchController` - requests pages one at a time until the cap is hit,
//!   the cursor runs out, a request fails, or the run is cancelled
//! - `BackoffPolicy` - exponential backoff with a retry budget for 429s
//! - `FetchOutcome` - the collected records plus why the run ended
//!
//! Every way a run can end returns the records collected so far. Only
//! invalid arguments produce an `Err`.

mod backoff;
mod types;

pub use backoff::{
    BackoffConfig, BackoffPolicy, Decision, DEFAULT_BACKOFF_FLOOR, DEFAULT_RETRY_BUDGET,
};
pub use types::{FetchOutcome, FetchSession, FetchStats, Termination};

use crate::connector::{PageSource, RequestOutcome};
use crate::error::{Error, Result};
use crate::pagination::CursorTracker;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Drives a fetch session against a page source
pub struct FetchController<S> {
    source: S,
    backoff: BackoffPolicy,
    tracker: CursorTracker,
    cancel: CancellationToken,
}

impl<S: PageSource> FetchController<S> {
    /// Create a controller with default backoff settings
    pub fn new(source: S) -> Self {
        Self {
            source,
            backoff: BackoffPolicy::default(),
            tracker: CursorTracker::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Set backoff configuration
    #[must_use]
    pub fn with_backoff(mut self, config: BackoffConfig) -> Self {
        self.backoff = BackoffPolicy::new(config);
        self
    }

    /// Use an externally owned cancellation token
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels this controller's runs
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Fetch up to `target_count` records, `page_size` per request
    ///
    /// The full `page_size` is always requested; the last page is trimmed
    /// locally. Cancellation is checked before each request, during backoff
    /// waits, and when a request returns. A page whose request finishes
    /// after cancellation is dropped.
    pub async fn fetch(&self, target_count: usize, page_size: u32) -> Result<FetchOutcome> {
        if target_count == 0 {
            return Err(Error::invalid_value("target_count", "must be positive"));
        }
        if page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be positive"));
        }

        let start = Instant::now();
        let backoff = *self.backoff.config();
        let mut session = FetchSession::new(target_count, &backoff);
        let mut stats = FetchStats::new();

        info!(target_count, page_size, "Starting fetch");

        let termination = loop {
            if session.is_full() {
                break Termination::CapReached;
            }
            if self.cancel.is_cancelled() {
                break Termination::Cancelled;
            }

            let outcome = self
                .source
                .fetch_page(session.cursor.as_deref(), page_size)
                .await;
            stats.requests += 1;

            if self.cancel.is_cancelled() {
                break Termination::Cancelled;
            }

            match outcome {
                RequestOutcome::Success(page) => {
                    session.record_success(&backoff);

                    let next_cursor = self.tracker.next(&page);
                    let received = page.len();
                    let kept = session.append(page.records);
                    stats.pages_fetched += 1;
                    stats.records_received += received;

                    debug!(
                        page = stats.pages_fetched,
                        received, kept, "Fetched page"
                    );
                    info!(
                        "Fetched {} of {} records",
                        session.collected.len(),
                        target_count
                    );

                    let exhausted = next_cursor.is_none();
                    session.cursor = next_cursor;

                    if session.is_full() {
                        break Termination::CapReached;
                    }
                    if exhausted {
                        break Termination::Exhausted;
                    }
                }

                RequestOutcome::RateLimited {
                    retry_after_seconds,
                } => {
                    stats.rate_limit_hits += 1;
                    session.consecutive_failures += 1;

                    match self
                        .backoff
                        .on_rate_limited(session.retry_delay, session.retries_remaining)
                    {
                        Decision::Retry {
                            wait,
                            next_delay,
                            retries_remaining,
                        } => {
                            warn!(
                                ?retry_after_seconds,
                                "Rate limit hit. Retrying after {:?} ({} retries left)",
                                wait,
                                retries_remaining
                            );
                            session.retry_delay = next_delay;
                            session.retries_remaining = retries_remaining;

                            let cancelled = tokio::select! {
                                () = self.cancel.cancelled() => true,
                                () = tokio::time::sleep(wait) => false,
                            };
                            if cancelled {
                                break Termination::Cancelled;
                            }
                            stats.backoff_waits.push(wait);
                        }
                        Decision::Abort => {
                            break Termination::RetryBudgetExhausted {
                                attempts: session.consecutive_failures,
                            };
                        }
                    }
                }

                RequestOutcome::TransportFailure(err) => {
                    break Termination::TransportFailure {
                        message: err.to_string(),
                    };
                }
            }
        };

        session.collected.truncate(target_count);
        stats.duration_ms = start.elapsed().as_millis() as u64;

        if termination.is_failure() {
            warn!(
                records = session.collected.len(),
                "Fetch stopped early: {termination}. Keeping records collected so far"
            );
        } else if termination.is_cancelled() {
            info!(
                records = session.collected.len(),
                "Fetch interrupted by user. Proceeding with the records collected so far"
            );
        } else {
            info!(
                records = session.collected.len(),
                pages = stats.pages_fetched,
                "Fetch finished: {termination}"
            );
        }

        Ok(FetchOutcome {
            records: session.collected,
            termination,
            last_cursor: session.cursor,
            stats,
        })
    }
}

impl<S> std::fmt::Debug for FetchController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchController")
            .field("backoff", &self.backoff)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
