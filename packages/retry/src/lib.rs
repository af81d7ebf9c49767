#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Retry policy and backoff combinator for transient failures.
//!
//! Callers describe *how* to retry with a [`RetryPolicy`] and *what* is
//! worth retrying by implementing [`Retryable`] on their error type. The
//! [`retry`] combinator then drives any async operation:
//!
//! ```ignore
//! use accident_map_retry::{RetryPolicy, retry};
//!
//! let policy = RetryPolicy::default(); // 3 attempts: 1s, 2s
//! let text = retry(&policy, "completion", None, || provider.complete(&prompt)).await?;
//! ```

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// An error that knows whether the failed operation may succeed if tried
/// again.
pub trait Retryable {
    /// Returns `true` if the operation should be attempted again.
    fn is_retryable(&self) -> bool;
}

/// How many times to attempt an operation and how long to wait in
/// between.
///
/// The wait after the `n`th failed attempt is
/// `base_delay * multiplier^(n - 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Wait after the first failed attempt.
    pub base_delay: Duration,
    /// Factor applied to the wait after each further failure.
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    /// Three attempts with 1s then 2s between them.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration, multiplier: u32) -> Self {
        Self {
            max_attempts,
            base_delay,
            multiplier,
        }
    }

    /// Returns the wait after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self
            .multiplier
            .saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error,
/// or the policy's attempts are used up.
///
/// The last error is returned when retries are exhausted. If `deadline` is
/// set, no wait is started that would end after it; the pending error is
/// returned instead.
///
/// # Errors
///
/// Returns the operation's error when it is not retryable, when
/// `policy.max_attempts` attempts have failed, or when the next wait would
/// pass `deadline`.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    deadline: Option<Instant>,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let mut attempt: u32 = 1;

    loop {
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !error.is_retryable() {
            return Err(error);
        }

        if attempt >= policy.max_attempts {
            log::warn!(
                "{label}: giving up after {attempt}/{} attempts: {error}",
                policy.max_attempts
            );
            return Err(error);
        }

        let delay = policy.delay_after(attempt);
        if let Some(deadline) = deadline
            && Instant::now() + delay > deadline
        {
            log::warn!("{label}: deadline reached, not retrying: {error}");
            return Err(error);
        }

        log::warn!(
            "{label}: {error}; retrying in {delay:?} (attempt {attempt}/{})",
            policy.max_attempts
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
