//! Retry Integration Tests
//!
//! Attempt counting, error propagation, and backoff timing for the retry
//! executor. Timing tests run on paused tokio time.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use nltask::core::{retry, RetriesExhausted, RetryPolicy};
use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};

#[derive(Debug, PartialEq)]
enum TestError {
    Attempt(u32),
    Exhausted(u32),
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<RetriesExhausted> for TestError {
    fn from(e: RetriesExhausted) -> Self {
        TestError::Exhausted(e.attempts)
    }
}

#[tokio::test(start_paused = true)]
async fn test_always_failing_operation_runs_max_attempts() {
    let counter = AtomicU32::new(0);
    let calls = &counter;
    let policy = RetryPolicy::new(3, Duration::from_millis(1000));

    let result: Result<(), TestError> = retry(&policy, move || async move {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        Err(TestError::Attempt(n))
    })
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // The last attempt's error, unwrapped
    assert_eq!(result, Err(TestError::Attempt(3)));
}

#[tokio::test(start_paused = true)]
async fn test_linear_backoff_total_delay() {
    let policy = RetryPolicy::new(3, Duration::from_millis(1000));
    let start = Instant::now();

    let result: Result<(), TestError> =
        retry(&policy, move || async move { Err(TestError::Attempt(0)) }).await;
    assert_err!(result);

    // 1000ms after attempt 1, 2000ms after attempt 2, nothing after the last
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(3000));
    assert!(elapsed < Duration::from_millis(4000));
    assert_eq!(policy.worst_case_delay(), Duration::from_millis(3000));
}

#[tokio::test(start_paused = true)]
async fn test_succeeds_after_transient_failures() {
    let counter = AtomicU32::new(0);
    let calls = &counter;
    let policy = RetryPolicy::new(3, Duration::from_millis(10));

    let result = retry(&policy, move || async move {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n < 3 {
            Err(TestError::Attempt(n))
        } else {
            Ok("done")
        }
    })
    .await;

    assert_eq!(assert_ok!(result), "done");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_first_success_does_not_sleep() {
    let counter = AtomicU32::new(0);
    let calls = &counter;
    let policy = RetryPolicy::new(3, Duration::from_secs(60));

    let result: Result<u32, TestError> = retry(&policy, move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(7)
    })
    .await;

    assert_eq!(result, Ok(7));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_zero_attempt_policy_never_invokes() {
    let counter = AtomicU32::new(0);
    let calls = &counter;
    let policy = RetryPolicy::new(0, Duration::ZERO);

    let result: Result<(), TestError> = retry(&policy, move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(result, Err(TestError::Exhausted(0)));
}
