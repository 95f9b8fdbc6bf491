//! Stepped-delay retry combinator.
//!
//! A [`RetryStrategy`] runs an operation once, then after each failure
//! sleeps for the next configured delay and tries again. With `n` delays it
//! makes at most `n + 1` attempts. Every failure is retried alike; callers
//! pick which operations to wrap.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dtek_core::DtekError;
use tracing::{debug, warn};

/// Default delays between attempts, in milliseconds.
pub const DEFAULT_DELAYS_MS: [u64; 3] = [500, 1000, 2000];

/// Callback fired before each sleep with the failed attempt number (from 1),
/// the failure, and the upcoming delay.
pub type RetryObserver = Arc<dyn Fn(u32, &DtekError, Duration) + Send + Sync>;

/// Strategy for retrying failed operations.
#[derive(Clone)]
pub struct RetryStrategy {
    delays: Vec<Duration>,
    observer: Option<RetryObserver>,
}

impl RetryStrategy {
    /// Creates a strategy from explicit delays.
    pub fn new(delays: Vec<Duration>) -> Self {
        Self {
            delays,
            observer: None,
        }
    }

    /// Creates a strategy from delays in milliseconds.
    pub fn from_millis(delays: &[u64]) -> Self {
        Self::new(delays.iter().copied().map(Duration::from_millis).collect())
    }

    /// Disables retries.
    pub fn no_retry() -> Self {
        Self::new(Vec::new())
    }

    /// Sets the observer callback.
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(u32, &DtekError, Duration) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Maximum number of attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        u32::try_from(self.delays.len()).map_or(u32::MAX, |n| n.saturating_add(1))
    }

    /// Returns the delay that follows a failed attempt (numbered from 1), or
    /// `None` when that attempt was the last.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        let index = usize::try_from(attempt.checked_sub(1)?).ok()?;
        self.delays.get(index).copied()
    }

    /// Runs `op` until it succeeds or the delays are used up.
    ///
    /// After the final failure the last error is wrapped in
    /// [`DtekError::RetryExhausted`].
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, DtekError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DtekError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let error = match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) => e,
            };

            let Some(delay) = self.delay_for_attempt(attempt) else {
                warn!(attempts = attempt, error = %error, "Retries exhausted");
                return Err(DtekError::RetryExhausted {
                    attempts: attempt,
                    last_error: Box::new(error),
                });
            };

            debug!(attempt, delay_ms = delay.as_millis(), error = %error, "Attempt failed, retrying");
            if let Some(observer) = &self.observer {
                observer(attempt, &error, delay);
            }
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::from_millis(&DEFAULT_DELAYS_MS)
    }
}

impl fmt::Debug for RetryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryStrategy")
            .field("delays", &self.delays)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
