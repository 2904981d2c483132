//! # Per-task retry budget.
//!
//! [`RetryPolicy`] is shared by every task of a scheduler, but the budget it
//! describes is **per task**: each envelope starts with `attempts_allowed = limit`
//! and counts its own retries. One task retrying never consumes another's budget.
//!
//! ```text
//! attempt fails with err
//!   ├─ !err.is_retryable()             → terminal
//!   ├─ attempts_used == attempts_allowed → terminal (last error wins)
//!   └─ otherwise: attempts_used += 1, sleep(backoff.next(attempts_used - 1)), retry
//! ```

use std::time::Duration;

use crate::{error::TaskError, policies::BackoffPolicy};

/// Bounded re-execution on failure.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RetryPolicy {
    /// Retries allowed per task after the first attempt (`0` = no retries).
    pub limit: u32,
    /// Delay schedule between attempts.
    pub backoff: BackoffPolicy,
}

impl RetryPolicy {
    /// Creates a policy with the given per-task retry limit and backoff.
    pub fn new(limit: u32, backoff: BackoffPolicy) -> Self {
        Self { limit, backoff }
    }

    /// A policy that never retries.
    pub fn never() -> Self {
        Self {
            limit: 0,
            backoff: BackoffPolicy::default(),
        }
    }

    /// Returns `true` if a task that has used `used` of `allowed` retries may retry after `err`.
    #[inline]
    pub fn permits(&self, used: u32, allowed: u32, err: &TaskError) -> bool {
        err.is_retryable() && used < allowed
    }

    /// Delay before retry number `retry` (0-indexed).
    #[inline]
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.backoff.next(retry)
    }
}
