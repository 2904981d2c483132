//! # Timeout guard: one attempt, raced against an optional deadline.
//!
//! The attempt runs as its own tokio task. When the deadline fires first the
//! guard cancels the attempt's token and **detaches** the task: it is
//! abandoned, not killed, and whatever it eventually produces is dropped
//! with the detached join handle. It can never reach the result table.
//!
//! ```text
//! Ok(v)                → Ok(v)
//! Err(e)               → Err(e)
//! deadline first       → cancel child token, detach → Err(Timeout)
//! attempt panicked     → Err(Panicked)
//! attempt torn down    → Err(Canceled)
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinError;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{TaskError, panic_message},
    tasks::TaskRef,
};

/// Runs one attempt of `task` under `parent`, bounded by `timeout` if set.
pub(crate) async fn run_attempt<T: Send + 'static>(
    task: &TaskRef<T>,
    parent: &CancellationToken,
    timeout: Option<Duration>,
) -> Result<T, TaskError> {
    let child = parent.child_token();
    let ctx = child.clone();
    let task = Arc::clone(task);
    let handle = tokio::spawn(async move { task.run(ctx).await });

    match timeout {
        Some(dur) => match time::timeout(dur, handle).await {
            Ok(joined) => flatten(joined),
            Err(_elapsed) => {
                child.cancel();
                Err(TaskError::Timeout { timeout: dur })
            }
        },
        None => flatten(handle.await),
    }
}

fn flatten<T>(joined: Result<Result<T, TaskError>, JoinError>) -> Result<T, TaskError> {
    match joined {
        Ok(res) => res,
        Err(e) if e.is_panic() => Err(TaskError::Panicked {
            info: panic_message(&*e.into_panic()),
        }),
        Err(_) => Err(TaskError::Canceled),
    }
}
