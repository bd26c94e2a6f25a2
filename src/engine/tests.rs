//! Tests for the fetch engine

use super::*;
use crate::connector::{PageSource, RequestOutcome};
use crate::pagination::PageResponse;
use crate::types::Record;
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Scripted Source
// ============================================================================

/// Replays a fixed list of outcomes and records what was asked for
struct ScriptedSource {
    script: Mutex<VecDeque<RequestOutcome>>,
    calls: Mutex<Vec<(Option<String>, u32)>>,
    cancel_on_call: Option<(usize, CancellationToken)>,
}

impl ScriptedSource {
    fn new(script: Vec<RequestOutcome>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
            cancel_on_call: None,
        }
    }

    /// Cancel `token` while the `call`-th request (1-based) is in flight
    fn cancel_during_call(mut self, call: usize, token: CancellationToken) -> Self {
        self.cancel_on_call = Some((call, token));
        self
    }

    fn calls(&self) -> Vec<(Option<String>, u32)> {
        self.calls.lock().unwrap().clone()
    }

    fn cursors(&self) -> Vec<Option<String>> {
        self.calls().into_iter().map(|(cursor, _)| cursor).collect()
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn fetch_page(&self, cursor: Option<&str>, limit: u32) -> RequestOutcome {
        let call_number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((cursor.map(str::to_string), limit));
            calls.len()
        };

        if let Some((call, token)) = &self.cancel_on_call {
            if *call == call_number {
                token.cancel();
            }
        }

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                RequestOutcome::TransportFailure(crate::Error::Other(
                    "script exhausted".to_string(),
                ))
            })
    }
}

fn records(range: std::ops::Range<usize>) -> Vec<Record> {
    range
        .map(|i| match json!({"id": i, "name": format!("person {i}")}) {
            serde_json::Value::Object(obj) => obj,
            _ => unreachable!(),
        })
        .collect()
}

fn page(range: std::ops::Range<usize>, next: Option<&str>) -> RequestOutcome {
    RequestOutcome::Success(PageResponse::new(records(range), next.map(str::to_string)))
}

fn rate_limited() -> RequestOutcome {
    RequestOutcome::RateLimited {
        retry_after_seconds: None,
    }
}

fn ids(outcome: &FetchOutcome) -> Vec<u64> {
    outcome
        .records
        .iter()
        .map(|r| r["id"].as_u64().unwrap())
        .collect()
}

fn ms(values: &[u64]) -> Vec<Duration> {
    values.iter().copied().map(Duration::from_millis).collect()
}

// ============================================================================
// Session Tests
// ============================================================================

#[test]
fn test_session_append_trims_to_remaining() {
    let mut session = FetchSession::new(5, &BackoffConfig::default());

    assert_eq!(session.append(records(0..3)), 3);
    assert_eq!(session.remaining(), 2);
    assert_eq!(session.append(records(3..10)), 2);
    assert!(session.is_full());
    assert_eq!(session.collected.len(), 5);
    assert_eq!(session.collected[4]["id"], 4);
}

#[test]
fn test_session_record_success_resets_backoff() {
    let backoff = BackoffConfig::new(Duration::from_millis(250), 3);
    let mut session = FetchSession::new(10, &backoff);
    session.consecutive_failures = 2;
    session.retry_delay = Duration::from_secs(1);
    session.retries_remaining = 1;

    session.record_success(&backoff);

    assert_eq!(session.consecutive_failures, 0);
    assert_eq!(session.retry_delay, Duration::from_millis(250));
    assert_eq!(session.retries_remaining, 3);
}

#[test]
fn test_termination_classification() {
    assert!(Termination::CapReached.is_complete());
    assert!(Termination::Exhausted.is_complete());
    assert!(!Termination::Cancelled.is_failure());
    assert!(Termination::Cancelled.is_cancelled());
    assert!(Termination::RetryBudgetExhausted { attempts: 6 }.is_failure());
    assert!(Termination::TransportFailure {
        message: "boom".to_string()
    }
    .is_failure());
    assert_eq!(
        Termination::RetryBudgetExhausted { attempts: 6 }.to_string(),
        "rate limited 6 times in a row, retry budget exhausted"
    );
}

// ============================================================================
// Fetch Loop Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_three_pages_until_exhaustion() {
    let source = ScriptedSource::new(vec![
        page(0..100, Some("c1")),
        page(100..200, Some("c2")),
        page(200..250, None),
    ]);
    let controller = FetchController::new(&source);

    let outcome = controller.fetch(250, 100).await.unwrap();

    assert_eq!(outcome.len(), 250);
    assert_eq!(ids(&outcome), (0..250).collect::<Vec<u64>>());
    assert_eq!(outcome.termination, Termination::CapReached);
    assert_eq!(outcome.stats.pages_fetched, 3);
    assert_eq!(outcome.stats.rate_limit_hits, 0);
    assert!(outcome.stats.backoff_waits.is_empty());
    assert_eq!(
        source.calls(),
        vec![
            (None, 100),
            (Some("c1".to_string()), 100),
            (Some("c2".to_string()), 100),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_exhaustion_before_cap() {
    let source = ScriptedSource::new(vec![page(0..100, Some("c1")), page(100..130, None)]);
    let controller = FetchController::new(&source);

    let outcome = controller.fetch(1000, 100).await.unwrap();

    assert_eq!(outcome.len(), 130);
    assert_eq!(outcome.termination, Termination::Exhausted);
    assert_eq!(outcome.last_cursor, None);
}

#[tokio::test(start_paused = true)]
async fn test_empty_cursor_is_exhaustion() {
    let source = ScriptedSource::new(vec![page(0..10, Some(""))]);
    let controller = FetchController::new(&source);

    let outcome = controller.fetch(100, 10).await.unwrap();

    assert_eq!(outcome.len(), 10);
    assert_eq!(outcome.termination, Termination::Exhausted);
    assert_eq!(source.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_last_page_trimmed_to_cap() {
    let source = ScriptedSource::new(vec![page(0..100, Some("c1")), page(100..200, Some("c2"))]);
    let controller = FetchController::new(&source);

    let outcome = controller.fetch(150, 100).await.unwrap();

    assert_eq!(outcome.len(), 150);
    assert_eq!(ids(&outcome), (0..150).collect::<Vec<u64>>());
    assert_eq!(outcome.termination, Termination::CapReached);
    assert_eq!(outcome.stats.records_received, 200);
    // Cap reached, so the cursor is left at its last known value
    assert_eq!(outcome.last_cursor.as_deref(), Some("c2"));
    // Full page requested every time
    assert!(source.calls().iter().all(|(_, limit)| *limit == 100));
}

#[tokio::test(start_paused = true)]
async fn test_cap_smaller_than_first_page() {
    let source = ScriptedSource::new(vec![page(0..100, Some("c1"))]);
    let controller = FetchController::new(&source);

    let outcome = controller.fetch(7, 100).await.unwrap();

    assert_eq!(ids(&outcome), vec![0, 1, 2, 3, 4, 5, 6]);
    assert_eq!(source.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_short_pages_keep_going_while_cursor_present() {
    let source = ScriptedSource::new(vec![
        page(0..3, Some("c1")),
        page(3..3, Some("c2")),
        page(3..5, None),
    ]);
    let controller = FetchController::new(&source);

    let outcome = controller.fetch(100, 50).await.unwrap();

    assert_eq!(ids(&outcome), vec![0, 1, 2, 3, 4]);
    assert_eq!(outcome.stats.pages_fetched, 3);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_then_success() {
    let source = ScriptedSource::new(vec![rate_limited(), page(0..100, None)]);
    let controller = FetchController::new(&source);

    let started = tokio::time::Instant::now();
    let outcome = controller.fetch(200, 100).await.unwrap();

    assert_eq!(outcome.len(), 100);
    assert_eq!(outcome.termination, Termination::Exhausted);
    assert_eq!(outcome.stats.rate_limit_hits, 1);
    assert_eq!(outcome.stats.backoff_waits, vec![Duration::from_secs(1)]);
    assert!(started.elapsed() >= Duration::from_secs(1));
    // Same request re-issued
    assert_eq!(source.cursors(), vec![None, None]);
}

#[tokio::test(start_paused = true)]
async fn test_retry_reuses_cursor() {
    let source = ScriptedSource::new(vec![
        page(0..10, Some("c1")),
        rate_limited(),
        rate_limited(),
        page(10..20, None),
    ]);
    let controller = FetchController::new(&source)
        .with_backoff(BackoffConfig::new(Duration::from_millis(10), 5));

    let outcome = controller.fetch(100, 10).await.unwrap();

    assert_eq!(ids(&outcome), (0..20).collect::<Vec<u64>>());
    assert_eq!(
        source.cursors(),
        vec![
            None,
            Some("c1".to_string()),
            Some("c1".to_string()),
            Some("c1".to_string()),
        ]
    );
    assert_eq!(outcome.stats.backoff_waits, ms(&[10, 20]));
}

#[tokio::test(start_paused = true)]
async fn test_backoff_resets_after_success() {
    let source = ScriptedSource::new(vec![
        rate_limited(),
        rate_limited(),
        rate_limited(),
        page(0..10, Some("c1")),
        rate_limited(),
        rate_limited(),
        page(10..20, None),
    ]);
    let controller = FetchController::new(&source)
        .with_backoff(BackoffConfig::new(Duration::from_millis(100), 3));

    let outcome = controller.fetch(100, 10).await.unwrap();

    assert_eq!(outcome.len(), 20);
    assert_eq!(outcome.termination, Termination::Exhausted);
    assert_eq!(outcome.stats.backoff_waits, ms(&[100, 200, 400, 100, 200]));
}

#[tokio::test(start_paused = true)]
async fn test_retry_budget_exhausted_keeps_partial() {
    let mut script = vec![page(0..50, Some("c1"))];
    // budget + 1 consecutive 429s
    script.extend((0..6).map(|_| rate_limited()));
    let source = ScriptedSource::new(script);
    let controller = FetchController::new(&source);

    let outcome = controller.fetch(1000, 50).await.unwrap();

    assert_eq!(ids(&outcome), (0..50).collect::<Vec<u64>>());
    assert_eq!(
        outcome.termination,
        Termination::RetryBudgetExhausted { attempts: 6 }
    );
    assert!(outcome.termination.is_failure());
    assert_eq!(
        outcome.stats.backoff_waits,
        ms(&[1000, 2000, 4000, 8000, 16000])
    );
    assert_eq!(outcome.stats.total_backoff(), Duration::from_secs(31));
    // run time follows the paused clock
    assert!(outcome.stats.duration_ms >= 31_000);
    assert!(outcome.stats.duration_ms < 32_000);
    assert_eq!(outcome.last_cursor.as_deref(), Some("c1"));
    assert_eq!(source.calls().len(), 7);
}

#[tokio::test(start_paused = true)]
async fn test_budget_exhausted_on_first_request_returns_empty() {
    let source = ScriptedSource::new((0..3).map(|_| rate_limited()).collect());
    let controller = FetchController::new(&source)
        .with_backoff(BackoffConfig::new(Duration::from_millis(1), 2));

    let outcome = controller.fetch(10, 10).await.unwrap();

    assert!(outcome.is_empty());
    assert_eq!(
        outcome.termination,
        Termination::RetryBudgetExhausted { attempts: 3 }
    );
}

#[tokio::test(start_paused = true)]
async fn test_transport_failure_not_retried() {
    let source = ScriptedSource::new(vec![
        page(0..10, Some("c1")),
        RequestOutcome::TransportFailure(crate::Error::http_status(500, "oops")),
        page(10..20, None),
    ]);
    let controller = FetchController::new(&source);

    let outcome = controller.fetch(100, 10).await.unwrap();

    assert_eq!(outcome.len(), 10);
    assert_eq!(
        outcome.termination,
        Termination::TransportFailure {
            message: "HTTP 500: oops".to_string()
        }
    );
    assert_eq!(source.calls().len(), 2);
    assert!(outcome.stats.backoff_waits.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_before_start_issues_no_requests() {
    let source = ScriptedSource::new(vec![page(0..10, None)]);
    let controller = FetchController::new(&source);
    controller.cancellation_token().cancel();

    let outcome = controller.fetch(100, 10).await.unwrap();

    assert!(outcome.is_empty());
    assert_eq!(outcome.termination, Termination::Cancelled);
    assert!(source.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_request_drops_that_page() {
    let token = CancellationToken::new();
    let source = ScriptedSource::new(vec![
        page(0..10, Some("c1")),
        page(10..20, Some("c2")),
        page(20..30, Some("c3")),
        page(30..40, None),
    ])
    .cancel_during_call(3, token.clone());
    let controller = FetchController::new(&source).with_cancellation(token);

    let outcome = controller.fetch(100, 10).await.unwrap();

    assert_eq!(ids(&outcome), (0..20).collect::<Vec<u64>>());
    assert_eq!(outcome.termination, Termination::Cancelled);
    assert_eq!(source.calls().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_backoff_wait() {
    let source = ScriptedSource::new(vec![
        page(0..10, Some("c1")),
        rate_limited(),
        page(10..20, None),
    ]);
    let controller = FetchController::new(&source)
        .with_backoff(BackoffConfig::new(Duration::from_secs(10), 5));
    let token = controller.cancellation_token();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        token.cancel();
    });

    let started = tokio::time::Instant::now();
    let outcome = controller.fetch(100, 10).await.unwrap();

    assert_eq!(outcome.len(), 10);
    assert_eq!(outcome.termination, Termination::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(outcome.stats.backoff_waits.is_empty());
    assert_eq!(source.calls().len(), 2);
}

#[tokio::test]
async fn test_invalid_arguments() {
    let source = ScriptedSource::new(vec![]);
    let controller = FetchController::new(&source);

    let err = controller.fetch(0, 100).await.unwrap_err();
    assert!(err.to_string().contains("target_count"));

    let err = controller.fetch(10, 0).await.unwrap_err();
    assert!(err.to_string().contains("page_size"));

    assert!(source.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_result_never_exceeds_target() {
    for target in [1usize, 9, 10, 11, 25, 30, 31] {
        let source = ScriptedSource::new(vec![
            page(0..10, Some("a")),
            page(10..20, Some("b")),
            page(20..30, None),
        ]);
        let controller = FetchController::new(&source);

        let outcome = controller.fetch(target, 10).await.unwrap();

        assert_eq!(outcome.len(), target.min(30), "target {target}");
    }
}
