//! Bounded retry for wallet calls
//!
//! Only narrowly scoped transient conditions are retried (see
//! [`RetryPolicy::execute_if`]); a chain verdict or a user rejection is never
//! retried. Delays run on a [`TimeEffects`] clock so tests need no real time.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{debug, warn};

use crate::effects::TimeEffects;

/// Backoff strategy for retry delays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed,
    /// Linear increase: delay * (attempt + 1)
    Linear,
    /// Exponential increase: delay * 2^attempt
    Exponential,
    /// Exponential with up to 10% jitter
    ExponentialWithJitter,
}

impl BackoffStrategy {
    /// Delay in milliseconds before retry number `attempt` (0 = first retry)
    pub fn calculate_delay_ms(&self, attempt: u32, initial_ms: u64, max_ms: u64) -> u64 {
        let delay = match self {
            BackoffStrategy::Fixed => initial_ms,
            BackoffStrategy::Linear => initial_ms.saturating_mul(u64::from(attempt) + 1),
            BackoffStrategy::Exponential => {
                initial_ms.saturating_mul(2u64.saturating_pow(attempt))
            }
            BackoffStrategy::ExponentialWithJitter => {
                let base = initial_ms.saturating_mul(2u64.saturating_pow(attempt));
                let jitter = (base as f64 * 0.1 * rand::thread_rng().gen::<f64>()) as u64;
                base.saturating_add(jitter)
            }
        };

        delay.min(max_ms)
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt (0 = no retries)
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds
    pub initial_delay_ms: u64,
    /// Upper bound on any single delay, in milliseconds
    pub max_delay_ms: u64,
    /// Backoff strategy to use
    pub strategy: BackoffStrategy,
}

impl RetryPolicy {
    /// Exponential backoff, three retries
    pub fn exponential() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 4_000,
            strategy: BackoffStrategy::Exponential,
        }
    }

    /// Linear backoff, three retries
    pub fn linear() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 4_000,
            strategy: BackoffStrategy::Linear,
        }
    }

    /// Set maximum retries
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set initial delay
    pub fn with_initial_delay_ms(mut self, delay_ms: u64) -> Self {
        self.initial_delay_ms = delay_ms;
        self
    }

    /// Delay before retry number `attempt`
    pub fn calculate_delay_ms(&self, attempt: u32) -> u64 {
        self.strategy
            .calculate_delay_ms(attempt, self.initial_delay_ms, self.max_delay_ms)
    }

    /// Run `operation`, retrying only errors accepted by `should_retry`.
    ///
    /// Errors rejected by the predicate propagate immediately. When retries
    /// run out the last error is returned.
    pub async fn execute_if<T, E, F, Fut, P, C>(
        &self,
        clock: &C,
        mut operation: F,
        should_retry: P,
    ) -> RetryResult<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        C: TimeEffects + ?Sized,
        E: std::fmt::Display,
    {
        let mut attempt = 0;
        let mut total_delay_ms = 0;

        loop {
            match operation().await {
                Ok(value) => {
                    return RetryResult {
                        result: Ok(value),
                        attempts: attempt + 1,
                        total_retry_delay_ms: total_delay_ms,
                    };
                }
                Err(err) if should_retry(&err) && attempt < self.max_retries => {
                    let delay = self.calculate_delay_ms(attempt);
                    debug!(attempt, delay_ms = delay, error = %err, "retrying transient failure");
                    clock.sleep_ms(delay).await;
                    total_delay_ms += delay;
                    attempt += 1;
                }
                Err(err) => {
                    if should_retry(&err) {
                        warn!(attempts = attempt + 1, error = %err, "retries exhausted");
                    }
                    return RetryResult {
                        result: Err(err),
                        attempts: attempt + 1,
                        total_retry_delay_ms: total_delay_ms,
                    };
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential()
    }
}

/// Result of a retried operation with statistics
#[derive(Debug, Clone)]
pub struct RetryResult<T, E> {
    /// Final result
    pub result: Result<T, E>,
    /// Attempts made, including the first
    pub attempts: u32,
    /// Total time spent waiting between attempts
    pub total_retry_delay_ms: u64,
}

impl<T, E> RetryResult<T, E> {
    /// Check if any retries were performed
    pub fn had_retries(&self) -> bool {
        self.attempts > 1
    }

    /// Get the result
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}
