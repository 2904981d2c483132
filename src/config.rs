//! # Scheduler configuration.
//!
//! Provides [`SchedulerConfig`], the settings a [`Scheduler`](crate::Scheduler) is built from.
//! The config is validated once, at construction; an invalid config yields a
//! [`ConfigError`] and no scheduler.
//!
//! ## Sentinel values
//! - `timeout = Some(0s)` → no timeout (same as `None`)
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

use crate::{
    error::ConfigError,
    policies::{BackoffPolicy, RetryPolicy},
};

/// Configuration for one scheduler instance.
///
/// ## Field semantics
/// - `max_concurrency`: admission ceiling, at most this many tasks run at once (`>= 1`)
/// - `min_concurrency`: validated lower bound (`1 <= min <= max`); admission does not adapt to it
/// - `timeout`: per-attempt deadline applied uniformly to every task
/// - `retry_limit`: retries per task after the first attempt
/// - `backoff`: delay schedule between retries
/// - `debug`: publish admit/settle trace events to the scheduler's bus
/// - `bus_capacity`: ring buffer size of the trace bus
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Maximum number of tasks executing at any instant.
    pub max_concurrency: usize,

    /// Lower bound of the concurrency range.
    ///
    /// Only validated; the gate always admits up to `max_concurrency`.
    pub min_concurrency: usize,

    /// Per-attempt deadline (`None` or zero = no deadline).
    pub timeout: Option<Duration>,

    /// Retries allowed per task. Each task has its own budget.
    pub retry_limit: u32,

    /// Delay between retries of one task.
    pub backoff: BackoffPolicy,

    /// Emit structured trace events (`Admit`, `Settle`, ...) to subscribers.
    pub debug: bool,

    /// Capacity of the trace bus broadcast channel.
    ///
    /// Receivers lagging more than this many events skip the oldest ones.
    pub bus_capacity: usize,
}

impl SchedulerConfig {
    /// Checks the concurrency range.
    ///
    /// # Errors
    /// - [`ConfigError::ZeroMaxConcurrency`] if `max_concurrency < 1`
    /// - [`ConfigError::ZeroMinConcurrency`] if `min_concurrency < 1`
    /// - [`ConfigError::MinAboveMax`] if `min_concurrency > max_concurrency`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::ZeroMaxConcurrency);
        }
        if self.min_concurrency == 0 {
            return Err(ConfigError::ZeroMinConcurrency);
        }
        if self.min_concurrency > self.max_concurrency {
            return Err(ConfigError::MinAboveMax {
                min: self.min_concurrency,
                max: self.max_concurrency,
            });
        }
        Ok(())
    }

    /// Returns the fixed admission ceiling.
    #[inline]
    pub fn concurrency_ceiling(&self) -> usize {
        self.max_concurrency
    }

    /// Returns the per-attempt deadline, treating zero as "none".
    #[inline]
    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.timeout.filter(|d| !d.is_zero())
    }

    /// Returns the retry policy shared by all tasks of the scheduler.
    #[inline]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_limit, self.backoff)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a copy with the given concurrency ceiling.
    ///
    /// `min_concurrency` is left as is; [`validate`](Self::validate) rejects a
    /// range where it exceeds `max`.
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    /// Returns a copy with the given lower bound of the concurrency range.
    pub fn with_min_concurrency(mut self, min: usize) -> Self {
        self.min_concurrency = min;
        self
    }

    /// Returns a copy with the given per-attempt deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns a copy with the given per-task retry limit.
    pub fn with_retry_limit(mut self, limit: u32) -> Self {
        self.retry_limit = limit;
        self
    }

    /// Returns a copy with the given backoff.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Returns a copy with trace events switched on or off.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

impl Default for SchedulerConfig {
    /// Default configuration:
    ///
    /// - `max_concurrency = 4`, `min_concurrency = 1`
    /// - `timeout = None`
    /// - `retry_limit = 0`
    /// - `backoff = BackoffPolicy::default()`
    /// - `debug = false`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            min_concurrency: 1,
            timeout: None,
            retry_limit: 0,
            backoff: BackoffPolicy::default(),
            debug: false,
            bus_capacity: 1024,
        }
    }
}
