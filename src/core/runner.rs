//! # Execution pipeline for one admitted envelope.
//!
//! RetryPolicy → TimeoutGuard → task, as a single straight-line loop:
//!
//! ```text
//! loop {
//!   ├─► run_attempt(task, timeout)        (guard.rs)
//!   │     ├─ Ok(v)  ──► return Ok(v)
//!   │     └─ Err(e) ──► TimeoutHit if e is a timeout
//!   ├─► envelope.consume_retry(policy, e)
//!   │     └─ None   ──► return Err(e)      (last error is terminal)
//!   ├─► publish RetryScheduled{ delay, attempt }
//!   └─► sleep(delay) (aborts on scheduler shutdown → return Err(e))
//! }
//! ```
//!
//! ## Rules
//! - Attempts of one envelope run **sequentially**.
//! - Retrying never blocks the runtime: the wait is an async sleep.

use std::time::Duration;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use super::{envelope::TaskEnvelope, guard::run_attempt};
use crate::{
    error::TaskError,
    events::{Bus, TraceEvent, TraceKind},
    policies::RetryPolicy,
};

/// Per-scheduler execution settings handed to every envelope.
#[derive(Clone)]
pub(crate) struct RunnerParams {
    pub retry: RetryPolicy,
    pub timeout: Option<Duration>,
    /// Trace bus, present only in debug mode.
    pub trace: Option<Bus>,
}

/// Drives `envelope` until it produces a value or its retries are exhausted.
pub(crate) async fn execute<T: Send + 'static>(
    envelope: &mut TaskEnvelope<T>,
    params: &RunnerParams,
    runtime_token: &CancellationToken,
) -> Result<T, TaskError> {
    loop {
        let err = match run_attempt(envelope.task(), runtime_token, params.timeout).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if let (TaskError::Timeout { timeout }, Some(bus)) = (&err, &params.trace) {
            bus.publish(
                TraceEvent::new(TraceKind::TimeoutHit)
                    .with_index(envelope.index())
                    .with_attempt(envelope.attempt())
                    .with_timeout(*timeout),
            );
        }

        let failed_attempt = envelope.attempt();
        let Some(retry) = envelope.consume_retry(&params.retry, &err) else {
            return Err(err);
        };
        let delay = params.retry.delay_for(retry);

        if let Some(bus) = &params.trace {
            bus.publish(
                TraceEvent::new(TraceKind::RetryScheduled)
                    .with_index(envelope.index())
                    .with_attempt(failed_attempt)
                    .with_delay(delay)
                    .with_reason(err.to_string()),
            );
        }

        let sleep = time::sleep(delay);
        tokio::pin!(sleep);
        select! {
            _ = &mut sleep => {}
            _ = runtime_token.cancelled() => return Err(err),
        }
    }
}
