//! # Retry Policy
//!
//! Retry policy with exponential backoff for handling transient failures.
//!
//! This module provides [`RetryPolicy`] for configuring retry behavior and
//! [`execute_with_retry`] for executing operations with automatic retries.
//! The kernel's only retried failure is the optimistic-locking conflict:
//! a losing `transition` caller is retried exactly once before the
//! conflict is surfaced.
//!
//! # Example
//!
//! ```
//! use trade_kernel::application::services::retry::{execute_with_retry, RetryPolicy, Retryable};
//!
//! #[derive(Debug)]
//! struct MyError(bool);
//!
//! impl Retryable for MyError {
//!     fn is_retryable(&self) -> bool {
//!         self.0
//!     }
//! }
//!
//! async fn fallible_operation() -> Result<String, MyError> {
//!     Ok("success".to_string())
//! }
//!
//! # async fn example() {
//! let policy = RetryPolicy::default();
//! let result = execute_with_retry(&policy, || fallible_operation()).await;
//! # }
//! ```

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Trait for errors that can indicate whether they are retryable.
pub trait Retryable {
    /// Returns true if the error is transient and the operation should be retried.
    fn is_retryable(&self) -> bool;
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (0 means no retries, just the initial attempt).
    pub max_retries: u32,
    /// Initial delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum delay cap, in milliseconds.
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Jitter factor (0.0-1.0) to randomize delays and prevent thundering herd.
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 100,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy with custom parameters.
    #[must_use]
    pub fn new(
        max_retries: u32,
        initial_delay_ms: u64,
        max_delay_ms: u64,
        backoff_multiplier: f64,
        jitter_factor: f64,
    ) -> Self {
        Self {
            max_retries,
            initial_delay_ms,
            max_delay_ms,
            backoff_multiplier,
            jitter_factor: jitter_factor.clamp(0.0, 1.0),
        }
    }

    /// Creates a policy with no retries (fail fast).
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// The policy used for optimistic-locking conflicts: exactly one
    /// automatic retry after a short delay.
    #[must_use]
    pub fn single_conflict_retry() -> Self {
        Self {
            max_retries: 1,
            initial_delay_ms: 25,
            max_delay_ms: 100,
            backoff_multiplier: 1.0,
            jitter_factor: 0.2,
        }
    }

    /// Calculates the delay for a given attempt number (0-indexed).
    ///
    /// The delay is calculated as:
    /// `min(initial_delay * (multiplier ^ attempt), max_delay)`
    #[must_use]
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_delay =
            self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let capped_delay = base_delay.min(self.max_delay_ms as f64);
        Duration::from_millis(capped_delay as u64)
    }

    /// Calculates the delay with jitter applied.
    ///
    /// Jitter is applied as: `delay * (1 - jitter_factor * random())`
    #[must_use]
    pub fn calculate_delay_with_jitter(&self, attempt: u32) -> Duration {
        let base_delay = self.calculate_delay(attempt);
        if self.jitter_factor <= 0.0 {
            return base_delay;
        }

        let mut rng = rand::rng();
        let jitter: f64 = rng.random_range(0.0..self.jitter_factor);
        let millis = base_delay.as_millis() as f64 * (1.0 - jitter);
        Duration::from_millis(millis as u64)
    }
}

/// Executes an operation with automatic retries per the given policy.
///
/// Only errors whose [`Retryable::is_retryable`] returns true are
/// retried; any other error is returned immediately.
///
/// # Errors
///
/// Returns the last error once retries are exhausted.
pub async fn execute_with_retry<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    E: Retryable,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if !error.is_retryable() || attempt >= policy.max_retries {
                    return Err(error);
                }
                sleep(policy.calculate_delay_with_jitter(attempt)).await;
                attempt += 1;
            }
        }
    }
}
