/// Resilience helpers shared by the identity service and the app host
///
/// - **Timeout**: bound how long a caller waits on an external call
/// - **Backoff**: capped exponential delays for polling loops
///
/// # Example: bounded publish
///
/// ```rust,no_run
/// use resilience::with_timeout_result;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let result = with_timeout_result(Duration::from_secs(5), async {
///         // Your broker call here
///         Ok::<_, String>(())
///     })
///     .await;
///     let _ = result;
/// }
/// ```

pub mod backoff;
pub mod timeout;

pub use backoff::Backoff;
pub use timeout::{with_optional_timeout, with_timeout, with_timeout_result, TimeoutError};
