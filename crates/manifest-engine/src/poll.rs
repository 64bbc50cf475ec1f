//! Bounded polling

use crate::error::EngineError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Default interval between polling attempts
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Poll until a check yields a value or the timeout is exceeded.
///
/// # Arguments
/// * `timeout` - Overall deadline, measured from the first check
/// * `interval` - Time between checks
/// * `waiting_for` - Description used in the timeout error
/// * `check` - Returns `Ok(Some(_))` when done, `Ok(None)` to keep polling;
///   an error ends the loop immediately
///
/// The check always runs at least once. There is no cancellation other than
/// the deadline.
pub async fn poll_until<T, F, Fut>(
    timeout: Duration,
    interval: Duration,
    waiting_for: impl Into<String>,
    mut check: F,
) -> Result<T, EngineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, EngineError>>,
{
    let start = Instant::now();
    let waiting_for = waiting_for.into();

    loop {
        if let Some(value) = check().await? {
            return Ok(value);
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Err(EngineError::Timeout {
                waiting_for,
                elapsed,
            });
        }
        trace!("Still waiting for {}", waiting_for);
        tokio::time::sleep(interval.min(timeout - elapsed)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_returns_first_value() {
        let attempts = AtomicUsize::new(0);
        let value = poll_until(Duration::from_secs(5), Duration::from_millis(1), "value", || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst);
            async move { Ok((attempt >= 2).then_some(attempt)) }
        })
        .await
        .unwrap();
        assert_eq!(value, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out() {
        let err = poll_until(Duration::from_secs(15), POLL_INTERVAL, "nothing", || async {
            Ok::<Option<()>, EngineError>(None)
        })
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::Timeout { ref waiting_for, .. } if waiting_for == "nothing"));
    }

    #[tokio::test]
    async fn test_check_error_stops_polling() {
        let attempts = AtomicUsize::new(0);
        let err = poll_until(Duration::from_secs(5), Duration::from_millis(1), "value", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err::<Option<()>, _>(EngineError::Uninitialized) }
        })
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::Uninitialized));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
