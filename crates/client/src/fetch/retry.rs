//! Retry loop for network operations.
//!
//! Upstream mirrors flake. Every network operation gets up to
//! [`MAX_ATTEMPTS`] tries with an exponentially growing delay between
//! them; the delay before attempt `n + 1` is `BASE_DELAY * 2^(n - 1)`.

use std::time::Duration;

use metagen_core::Error;

pub const MAX_ATTEMPTS: u32 = 10;
pub const BASE_DELAY: Duration = Duration::from_millis(3000);

/// Run `op` until it succeeds or [`MAX_ATTEMPTS`] attempts are spent.
///
/// Every failed attempt except the last is logged at warn level together
/// with the delay before the next one. The final attempt's error is
/// returned unchanged.
pub async fn with_retry<T, F, Fut>(what: &str, mut op: F) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut attempt: u32 = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < MAX_ATTEMPTS => {
                let delay = BASE_DELAY * 2u32.pow(attempt - 1);
                tracing::warn!(
                    attempt,
                    "failed to {what}: {err}; retrying in {:.0?}",
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::time::Instant;

    use super::*;

    #[tokio::test]
    async fn test_first_success_returns_immediately() {
        let calls = Arc::new(AtomicUsize::new(0));
        let result = with_retry("fetch nothing", || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Error>(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delays_double_between_attempts() {
        let stamps: Arc<std::sync::Mutex<Vec<Instant>>> = Arc::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let result = with_retry("fetch flaky", || {
            let stamps = stamps.clone();
            let calls = calls.clone();
            async move {
                stamps.lock().unwrap().push(Instant::now());
                if calls.fetch_add(1, Ordering::SeqCst) < 3 {
                    Err(Error::Validation("transient".into()))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        let stamps = stamps.lock().unwrap();
        assert_eq!(stamps.len(), 4);
        assert_eq!(stamps[1] - stamps[0], Duration::from_millis(3000));
        assert_eq!(stamps[2] - stamps[1], Duration::from_millis(6000));
        assert_eq!(stamps[3] - stamps[2], Duration::from_millis(12000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let result: Result<(), Error> = with_retry("fetch broken", || {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(Error::Validation(format!("attempt {n}")))
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS as usize);
        assert!(result.unwrap_err().to_string().contains("attempt 10"));
    }
}
