//! Retry policies.
//!
//! This module groups the knobs that decide **whether** a failed task gets
//! another attempt and **how long** it waits before that attempt.
//!
//! ## Contents
//! - [`RetryPolicy`]   per-envelope attempt budget + backoff
//! - [`BackoffPolicy`] how retry delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization strategy to avoid synchronized retries
//!
//! ## Quick wiring
//! ```text
//! SchedulerConfig { retry_limit, backoff }
//!      └─► RetryPolicy { limit, backoff }
//!           ├─ limit    copied into every TaskEnvelope as attempts_allowed
//!           └─ backoff  .next(retry) gives the sleep before each retry
//! ```
//!
//! ## Defaults
//! - `retry_limit = 0` (a failure is terminal).
//! - `BackoffPolicy::default()` → first=100ms, factor=1.0 (constant), max=30s, jitter=None.

mod backoff;
mod jitter;
mod retry;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use retry::RetryPolicy;
