/// Timeout wrappers for async operations
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

#[derive(Debug, thiserror::Error)]
pub enum TimeoutError {
    #[error("Operation timed out after {0:?}")]
    Elapsed(Duration),
    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl TimeoutError {
    pub fn is_elapsed(&self) -> bool {
        matches!(self, TimeoutError::Elapsed(_))
    }
}

/// Execute a future with timeout
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    timeout(duration, future).await.map_err(|_| {
        tracing::debug!(timeout = ?duration, "Operation timed out");
        TimeoutError::Elapsed(duration)
    })
}

/// Execute a fallible future with timeout, flattening both failure modes
pub async fn with_timeout_result<F, T, E>(duration: Duration, future: F) -> Result<T, TimeoutError>
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    match timeout(duration, future).await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => Err(TimeoutError::OperationFailed(e.to_string())),
        Err(_) => {
            tracing::debug!(timeout = ?duration, "Operation timed out");
            Err(TimeoutError::Elapsed(duration))
        }
    }
}

/// Execute a future with an optional deadline.
///
/// `None` waits for as long as the future takes.
pub async fn with_optional_timeout<F, T>(
    duration: Option<Duration>,
    future: F,
) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    match duration {
        Some(duration) => with_timeout(duration, future).await,
        None => Ok(future.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timeout_success() {
        let result = with_timeout(Duration::from_secs(1), async { 42 }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_timeout_elapsed() {
        let result = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            42
        })
        .await;

        assert!(matches!(result, Err(TimeoutError::Elapsed(_))));
    }

    #[tokio::test]
    async fn test_timeout_result_operation_failed() {
        let result = with_timeout_result(Duration::from_secs(1), async {
            Err::<i32, _>("broker unavailable")
        })
        .await;

        match result {
            Err(TimeoutError::OperationFailed(msg)) => assert_eq!(msg, "broker unavailable"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_optional_timeout_none_waits() {
        let result = with_optional_timeout(None, async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            7
        })
        .await;

        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_optional_timeout_some_elapses() {
        let result = with_optional_timeout(Some(Duration::from_millis(10)), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
        })
        .await;

        assert!(result.unwrap_err().is_elapsed());
    }
}
