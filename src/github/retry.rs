//! Exponential backoff for GitHub API calls.
//!
//! Only transient errors are retried; the default schedule waits 2s, 4s and
//! 8s before giving up. Permanent errors are returned on the first failure.

use std::future::Future;
use std::time::Duration;

use super::error::GitHubApiError;
use crate::effects::GitHubEffect;

/// Backoff schedule. Each delay doubles the previous one, up to `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryConfig {
    pub const DEFAULT: Self = Self {
        max_retries: 3,
        initial_delay: Duration::from_secs(2),
        max_delay: Duration::from_secs(30),
    };

    pub fn new(max_retries: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
            max_delay,
        }
    }

    /// Delay before retry number `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.initial_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map(|attempt| self.delay_for_attempt(attempt))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Whether transient failures are retried at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryPolicy {
    #[default]
    RetryTransient,
    NoRetry,
}

impl RetryPolicy {
    /// A 502 does not mean a write was dropped, so only effects that can
    /// safely run twice are retried. A failed write surfaces to the caller
    /// and the next event re-runs the cascade, which picks up whatever
    /// already landed.
    pub fn for_effect(effect: &GitHubEffect) -> Self {
        if effect.is_idempotent() {
            RetryPolicy::RetryTransient
        } else {
            RetryPolicy::NoRetry
        }
    }
}

/// Runs `operation` until it succeeds, fails permanently, or the schedule in
/// `config` is exhausted. The last error is returned in the latter two cases.
pub async fn retry_with_backoff<T, F, Fut>(
    config: RetryConfig,
    policy: RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, GitHubApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GitHubApiError>>,
{
    let budget = match policy {
        RetryPolicy::RetryTransient => config.max_retries as usize,
        RetryPolicy::NoRetry => 0,
    };
    let mut schedule = config.delays().take(budget).enumerate();

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        let (retry, delay) = match schedule.next() {
            Some(next) if err.kind.is_retriable() => next,
            _ => return Err(err),
        };

        tracing::warn!(
            operation = operation_name,
            retry = retry + 1,
            of = budget,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Transient GitHub error, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
