// Retry module
// Bounded retry with exponential backoff, shared by the chat and embedding clients

#[cfg(test)]
pub(crate) mod testing;

use std::fmt::Display;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::generation::GenerationErrorKind;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
const EXPONENTIAL_BACKOFF_BASE: u32 = 2;

/// How many times to call a backend and how long to wait in between.
///
/// `retryable` lists the generation failures worth another attempt. Callers
/// with their own failure types pass a classifier to [`retry_with_backoff`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub retryable: Vec<GenerationErrorKind>,
}

impl Default for BackoffPolicy {
    #[inline]
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            retryable: vec![
                GenerationErrorKind::Timeout,
                GenerationErrorKind::ConnectionFailed,
                GenerationErrorKind::StreamInterrupted,
                GenerationErrorKind::BackendRejected,
            ],
        }
    }
}

impl BackoffPolicy {
    #[inline]
    pub fn is_retryable(&self, kind: GenerationErrorKind) -> bool {
        self.retryable.contains(&kind)
    }

    /// Delay after the failed attempt numbered `attempt` (0-based)
    #[inline]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = EXPONENTIAL_BACKOFF_BASE
            .checked_pow(attempt)
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// Blocking wait between attempts
pub trait Sleeper: Send + Sync + std::fmt::Debug {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    #[inline]
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// The error that ended a retry loop and the attempt it happened on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryFailure<E> {
    pub error: E,
    pub attempts: u32,
}

/// Call `operation` until it succeeds, fails with an error `retryable` rejects,
/// or `policy.max_attempts` calls have failed. At least one call is made.
#[inline]
pub fn retry_with_backoff<T, E: Display>(
    policy: &BackoffPolicy,
    sleeper: &dyn Sleeper,
    mut operation: impl FnMut() -> Result<T, E>,
    retryable: impl Fn(&E) -> bool,
) -> Result<T, RetryFailure<E>> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        debug!("Attempt {}/{}", attempt, max_attempts);

        let error = match operation() {
            Ok(value) => {
                debug!("Succeeded on attempt {}", attempt);
                return Ok(value);
            }
            Err(error) => error,
        };

        if !retryable(&error) {
            warn!("Non-retryable failure: {}", error);
            return Err(RetryFailure {
                error,
                attempts: attempt,
            });
        }

        if attempt >= max_attempts {
            error!("All {} attempts failed, last error: {}", attempt, error);
            return Err(RetryFailure {
                error,
                attempts: attempt,
            });
        }

        let delay = policy.delay_for(attempt - 1);
        warn!(
            "Attempt {}/{} failed ({}), retrying in {:?}",
            attempt, max_attempts, error, delay
        );
        sleeper.sleep(delay);
    }
}
