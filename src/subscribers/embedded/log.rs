//! # LogWriter: trace events as `tracing` records
//!
//! A minimal subscriber that re-emits incoming [`TraceEvent`]s through the
//! `tracing` macros, under the `taskgate::trace` target. Install any
//! `tracing` subscriber to see them.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! DEBUG taskgate::trace: admit index=0 running=1 queued=2
//! DEBUG taskgate::trace: retry index=0 after_attempt=1 delay_ms=100 reason=error: boom
//!  WARN taskgate::trace: timeout index=3 attempt=1 timeout_ms=500
//! DEBUG taskgate::trace: settle index=0 status=Fulfilled attempts=2 running=0 queued=0
//!  WARN taskgate::trace: subscriber overflow subscriber="audit" reason=full
//! ```

use async_trait::async_trait;

use crate::events::{TraceEvent, TraceKind};
use crate::subscribers::Subscribe;

/// Trace writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &TraceEvent) {
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            TraceKind::Admit => {
                tracing::debug!(
                    target: "taskgate::trace",
                    index = ?e.index, running = e.running, queued = e.queued,
                    "admit"
                );
            }
            TraceKind::Settle => {
                tracing::debug!(
                    target: "taskgate::trace",
                    index = ?e.index, status = ?e.status, attempts = ?e.attempt,
                    running = e.running, queued = e.queued, reason,
                    "settle"
                );
            }
            TraceKind::RetryScheduled => {
                tracing::debug!(
                    target: "taskgate::trace",
                    index = ?e.index, after_attempt = ?e.attempt, delay_ms = ?e.delay_ms, reason,
                    "retry"
                );
            }
            TraceKind::TimeoutHit => {
                tracing::warn!(
                    target: "taskgate::trace",
                    index = ?e.index, attempt = ?e.attempt, timeout_ms = ?e.timeout_ms,
                    "timeout"
                );
            }
            TraceKind::SubscriberOverflow => {
                tracing::warn!(
                    target: "taskgate::trace",
                    subscriber = ?e.subscriber, reason,
                    "subscriber overflow"
                );
            }
            TraceKind::SubscriberPanicked => {
                tracing::warn!(
                    target: "taskgate::trace",
                    subscriber = e.subscriber.unwrap_or("unknown"), info = reason,
                    "subscriber panicked"
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
