//! Retry/backoff controller wrapping single provider calls.
//!
//! Each call's result is folded into a [`CallOutcome`] and an explicit loop
//! decides whether to sleep and try again. Only infrastructure failures are
//! retried: rate limits, 5xx, timeouts, and connection errors. A "no result"
//! answer is never retried.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use super::provider::{Disposition, ProviderError};
use crate::config::RetryConfig;

/// Tagged outcome of one provider call.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome<T> {
    Success(T),
    /// Rate-limited or transiently busy; worth another attempt.
    Retryable {
        retry_after: Option<Duration>,
        error: ProviderError,
    },
    /// Not-found class; the caller should advance to its next option.
    Skip(ProviderError),
    /// Anything else; the caller should treat the call as failed.
    Terminal(ProviderError),
}

impl<T> From<Result<T, ProviderError>> for CallOutcome<T> {
    fn from(result: Result<T, ProviderError>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(error) => match error.disposition() {
                Disposition::Retry(retry_after) => Self::Retryable { retry_after, error },
                Disposition::Skip => Self::Skip(error),
                Disposition::Terminal => Self::Terminal(error),
            },
        }
    }
}

impl<T> CallOutcome<T> {
    /// The value, if the call succeeded.
    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }
}

/// Record of a retried call: the final outcome plus how it got there.
///
/// `outcome` is never [`CallOutcome::Retryable`]; exhausting the attempt
/// budget turns the last retryable error into [`CallOutcome::Terminal`].
#[derive(Debug)]
pub struct Attempted<T> {
    pub outcome: CallOutcome<T>,
    /// Number of times the call was issued.
    pub attempts: u32,
    /// Sleeps taken between attempts, in order.
    pub delays: Vec<Duration>,
}

/// Exponential backoff policy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    multiplier: f64,
    max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        initial_backoff: Duration,
        multiplier: f64,
        max_backoff: Duration,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            multiplier: multiplier.max(1.0),
            max_backoff,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.initial_backoff_ms),
            config.multiplier,
            Duration::from_secs(config.max_backoff_secs),
        )
    }

    /// Delay before retry number `retry` (0-based).
    ///
    /// The computed backoff grows by `multiplier` each retry. A provider-supplied
    /// delay is honoured when it is longer. Both are capped at `max_backoff`.
    pub fn backoff(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let scaled = self.initial_backoff.as_secs_f64() * self.multiplier.powi(exponent);
        // Overflowing products saturate at the cap.
        let computed = Duration::try_from_secs_f64(scaled).unwrap_or(self.max_backoff);
        let wait = match retry_after {
            Some(requested) => computed.max(requested),
            None => computed,
        };
        wait.min(self.max_backoff)
    }

    /// Issue `call` until it succeeds, is classified Skip/Terminal, or the
    /// attempt budget runs out.
    pub async fn run<T, F, Fut>(&self, label: &str, mut call: F) -> Attempted<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut delays = Vec::new();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let outcome = CallOutcome::from(call().await);

            match outcome {
                CallOutcome::Retryable { retry_after, error } => {
                    if attempts >= self.max_attempts {
                        warn!(
                            call = label,
                            attempts,
                            error = %error,
                            "Retry budget exhausted"
                        );
                        return Attempted {
                            outcome: CallOutcome::Terminal(error),
                            attempts,
                            delays,
                        };
                    }

                    let wait = self.backoff(attempts - 1, retry_after);
                    warn!(
                        call = label,
                        attempt = attempts,
                        wait_ms = wait.as_millis() as u64,
                        error = %error,
                        "Transient provider failure, backing off"
                    );
                    tokio::time::sleep(wait).await;
                    delays.push(wait);
                }
                CallOutcome::Skip(error) => {
                    debug!(call = label, error = %error, "Provider call skipped");
                    return Attempted {
                        outcome: CallOutcome::Skip(error),
                        attempts,
                        delays,
                    };
                }
                CallOutcome::Terminal(error) => {
                    warn!(call = label, error = %error, "Provider call failed");
                    return Attempted {
                        outcome: CallOutcome::Terminal(error),
                        attempts,
                        delays,
                    };
                }
                CallOutcome::Success(value) => {
                    return Attempted {
                        outcome: CallOutcome::Success(value),
                        attempts,
                        delays,
                    };
                }
            }
        }
    }
}
