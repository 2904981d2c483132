//! Error types used by the scheduler and its tasks.
//!
//! This module defines two error enums:
//!
//! - [`ConfigError`] raised synchronously when a scheduler is built from an invalid config.
//! - [`TaskError`] produced by (or on behalf of) a single task and stored in its result slot.
//!
//! Per-task errors never escape as a top-level failure: they are recorded in the
//! task's [`ResultSlot`](crate::ResultSlot) and the aggregate result still resolves.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced while validating a [`SchedulerConfig`](crate::SchedulerConfig).
///
/// An invalid scheduler cannot be constructed; this is the only hard failure of the crate.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_concurrency` was zero; nothing could ever be admitted.
    #[error("max_concurrency must be at least 1")]
    ZeroMaxConcurrency,

    /// `min_concurrency` was zero.
    #[error("min_concurrency must be at least 1")]
    ZeroMinConcurrency,

    /// `min_concurrency` was larger than `max_concurrency`.
    #[error("min_concurrency {min} exceeds max_concurrency {max}")]
    MinAboveMax {
        /// Configured lower bound.
        min: usize,
        /// Configured ceiling.
        max: usize,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskgate::ConfigError;
    ///
    /// let err = ConfigError::MinAboveMax { min: 4, max: 2 };
    /// assert_eq!(err.as_label(), "config_min_above_max");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::ZeroMaxConcurrency => "config_zero_max_concurrency",
            ConfigError::ZeroMinConcurrency => "config_zero_min_concurrency",
            ConfigError::MinAboveMax { .. } => "config_min_above_max",
        }
    }
}

/// # Errors produced by task execution.
///
/// `Fail` and `Timeout` are retryable; everything else settles the task immediately.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The attempt did not settle before the configured deadline.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// Non-recoverable error (never retried).
    #[error("fatal error (no retry): {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Execution failed but may succeed if retried.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The task panicked while running.
    #[error("task panicked: {info}")]
    Panicked {
        /// Panic payload, if it was a string.
        info: String,
    },

    /// The attempt was torn down by the runtime before it produced an outcome.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for [`TaskError::Fatal`].
    pub fn fatal(error: impl Into<String>) -> Self {
        TaskError::Fatal {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskgate::TaskError;
    /// use std::time::Duration;
    ///
    /// let err = TaskError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "task_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            TaskError::Fatal { error } => format!("fatal: {error}"),
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Panicked { info } => format!("panic: {info}"),
            TaskError::Canceled => "context cancelled".to_string(),
        }
    }

    /// Indicates whether another attempt may be made after this error.
    ///
    /// Returns `true` for [`TaskError::Fail`] and [`TaskError::Timeout`].
    ///
    /// # Example
    /// ```
    /// use taskgate::TaskError;
    ///
    /// assert!(TaskError::fail("boom").is_retryable());
    /// assert!(!TaskError::fatal("nope").is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskError::Fail { .. } | TaskError::Timeout { .. })
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(ConfigError::ZeroMaxConcurrency.as_label(), "config_zero_max_concurrency");
        assert_eq!(TaskError::fail("x").as_label(), "task_failed");
        assert_eq!(TaskError::Canceled.as_label(), "task_canceled");
        assert_eq!(
            TaskError::Panicked { info: "p".into() }.as_label(),
            "task_panicked"
        );
    }

    #[test]
    fn test_only_fail_and_timeout_retry() {
        assert!(TaskError::Timeout { timeout: Duration::from_millis(5) }.is_retryable());
        assert!(!TaskError::Panicked { info: "p".into() }.is_retryable());
        assert!(!TaskError::Canceled.is_retryable());
    }

    #[test]
    fn test_display_keeps_executor_message() {
        let err = TaskError::fail("disk full");
        assert_eq!(err.to_string(), "execution failed: disk full");
        assert_eq!(err.as_message(), "error: disk full");

        let cfg = ConfigError::MinAboveMax { min: 5, max: 3 };
        assert_eq!(cfg.to_string(), "min_concurrency 5 exceeds max_concurrency 3");
    }
}
