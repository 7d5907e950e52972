//! Retry policy for content API calls.
//!
//! Only rate-limit responses are retried; every other failure returns
//! immediately. Backoff doubles per retry (2s, 4s, ... by default).

use backoff::future::retry_notify;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{info, warn};

use crate::content::error::TransportError;

/// Retry configuration shared by every content gateway call.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Factor applied to the delay for each further retry.
    pub backoff_multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(2),
            backoff_multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Same attempt budget, but no waiting between attempts.
    pub fn without_delay() -> Self {
        Self {
            initial_backoff: Duration::ZERO,
            ..Default::default()
        }
    }

    /// Delay before the `retry`-th retry (1-based).
    pub fn backoff_duration(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1);
        self.initial_backoff
            .saturating_mul(self.backoff_multiplier.saturating_pow(exponent))
    }

    /// Exponential schedule without jitter or an elapsed-time cap; the
    /// attempt budget is enforced by `run`.
    fn schedule(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_backoff)
            .with_multiplier(f64::from(self.backoff_multiplier))
            .with_randomization_factor(0.0)
            .with_max_interval(self.backoff_duration(self.max_attempts.max(1)))
            .with_max_elapsed_time(None)
            .build()
    }

    /// Execute `f` under this policy.
    ///
    /// Returns the value of the first successful attempt, or the last error
    /// together with the number of attempts made.
    pub async fn run<F, Fut, T>(&self, operation: &str, f: F) -> Result<T, RetryExhausted>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let attempts = AtomicU32::new(0);

        let result = retry_notify(
            self.schedule(),
            || {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                let call = f();
                async move {
                    call.await.map_err(|err| {
                        if is_retryable(&err) && attempt < max_attempts {
                            backoff::Error::transient(err)
                        } else {
                            backoff::Error::permanent(err)
                        }
                    })
                }
            },
            |_err: TransportError, wait: Duration| {
                warn!(
                    operation,
                    attempt = attempts.load(Ordering::SeqCst),
                    max_attempts,
                    wait_ms = wait.as_millis() as u64,
                    "Rate limit hit, retrying"
                );
            },
        )
        .await;

        let attempt = attempts.load(Ordering::SeqCst);
        match result {
            Ok(value) => {
                if attempt > 1 {
                    info!(operation, attempt, "Content API call succeeded after retry");
                }
                Ok(value)
            }
            Err(err) => {
                warn!(operation, attempt, error = %err, "Content API call failed");
                Err(RetryExhausted {
                    attempts: attempt,
                    last_error: err,
                })
            }
        }
    }
}

/// Final failure of a retried call.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryExhausted {
    pub attempts: u32,
    pub last_error: TransportError,
}

/// Whether a transport failure is worth another attempt.
pub fn is_retryable(err: &TransportError) -> bool {
    matches!(err, TransportError::RateLimited)
}
