//! # Task abstraction.
//!
//! A [`Task`] is the caller's operation. The scheduler may invoke [`Task::run`]
//! more than once (one call per attempt), so every call must start fresh work.
//!
//! Each attempt receives a [`CancellationToken`]. It is cancelled when the
//! attempt's deadline passes or the scheduler goes away; checking it is
//! optional, but a task that honors it stops wasting work once its result
//! can no longer be used.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// # Asynchronous, re-invocable operation.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use taskgate::{Task, TaskError};
///
/// struct Fetch { url: String }
///
/// #[async_trait]
/// impl Task<usize> for Fetch {
///     async fn run(&self, ctx: CancellationToken) -> Result<usize, TaskError> {
///         if ctx.is_cancelled() {
///             return Err(TaskError::Canceled);
///         }
///         Ok(self.url.len())
///     }
/// }
/// ```
#[async_trait]
pub trait Task<T: Send + 'static>: Send + Sync + 'static {
    /// Executes one attempt.
    async fn run(&self, ctx: CancellationToken) -> Result<T, TaskError>;
}

/// Shared handle to a task, as accepted by [`Scheduler`](crate::Scheduler).
pub type TaskRef<T> = Arc<dyn Task<T>>;
