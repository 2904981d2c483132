//! # Closure-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps `F: Fn(CancellationToken) -> Fut`. Each attempt calls the
//! closure again and awaits the **new** future, so retries never reuse state
//! from a failed attempt. Share state explicitly with `Arc<...>` inside the closure.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use taskgate::{TaskFn, TaskRef, TaskError};
//!
//! let t: TaskRef<u32> = TaskFn::arc(|_ctx: CancellationToken| async move {
//!     Ok::<_, TaskError>(7)
//! });
//! ```

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::task::{Task, TaskRef};

/// Function-backed task implementation.
pub struct TaskFn<F, T> {
    f: F,
    _out: PhantomData<fn() -> T>,
}

impl<F, T> TaskFn<F, T> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`].
    pub fn new(f: F) -> Self {
        Self {
            f,
            _out: PhantomData,
        }
    }
}

impl<F, Fut, T> TaskFn<F, T>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    T: Send + 'static,
{
    /// Creates the task and returns it as a shared handle.
    pub fn arc(f: F) -> TaskRef<T> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut, T> Task<T> for TaskFn<F, T>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    T: Send + 'static,
{
    async fn run(&self, ctx: CancellationToken) -> Result<T, TaskError> {
        (self.f)(ctx).await
    }
}
