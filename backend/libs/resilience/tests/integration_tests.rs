/// Integration tests for resilience library
use resilience::{with_optional_timeout, with_timeout, with_timeout_result, Backoff, TimeoutError};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

// ==================== Polling Tests ====================

/// Probe-style loop: keep trying with backoff until the attempt succeeds
async fn poll_until_ready(ready_after: u32, attempts: Arc<AtomicU32>) -> u32 {
    let mut backoff = Backoff::new(Duration::from_millis(1), Duration::from_millis(4));
    loop {
        if attempts.fetch_add(1, Ordering::SeqCst) + 1 >= ready_after {
            return backoff.attempts();
        }
        tokio::time::sleep(backoff.next_delay()).await;
    }
}

#[tokio::test]
async fn test_polling_loop_within_deadline() {
    let attempts = Arc::new(AtomicU32::new(0));

    let waited = assert_ok!(
        with_timeout(
            Duration::from_secs(2),
            poll_until_ready(5, Arc::clone(&attempts))
        )
        .await
    );

    assert_eq!(attempts.load(Ordering::SeqCst), 5);
    assert_eq!(waited, 4);
}

#[tokio::test]
async fn test_polling_loop_past_deadline() {
    let attempts = Arc::new(AtomicU32::new(0));

    let err = assert_err!(
        with_timeout(
            Duration::from_millis(50),
            poll_until_ready(u32::MAX, Arc::clone(&attempts))
        )
        .await
    );

    assert!(err.is_elapsed());
    assert!(attempts.load(Ordering::SeqCst) > 1);
}

#[tokio::test]
async fn test_indefinite_deadline_lets_loop_finish() {
    let attempts = Arc::new(AtomicU32::new(0));

    assert_ok!(with_optional_timeout(None, poll_until_ready(3, Arc::clone(&attempts))).await);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

// ==================== Timeout Tests ====================

#[tokio::test]
async fn test_operation_failure_is_not_a_timeout() {
    let err = assert_err!(
        with_timeout_result(Duration::from_secs(1), async {
            Err::<(), _>("broker unavailable")
        })
        .await
    );

    match err {
        TimeoutError::OperationFailed(message) => assert_eq!(message, "broker unavailable"),
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_slow_operation_is_a_timeout() {
    let err = assert_err!(
        with_timeout_result(Duration::from_millis(20), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, String>(())
        })
        .await
    );

    assert!(err.is_elapsed());
    assert_eq!(err.to_string(), "Operation timed out after 20ms");
}
