//! # Structured trace events emitted by the scheduler.
//!
//! Every event carries the gate's view at the moment it was produced:
//! `running` (tasks executing) and `queued` (tasks waiting for admission).
//!
//! ## Example
//! ```rust
//! use taskgate::{TraceEvent, TraceKind};
//!
//! let ev = TraceEvent::new(TraceKind::Admit)
//!     .with_index(3)
//!     .with_gauges(2, 5);
//!
//! assert_eq!(ev.kind, TraceKind::Admit);
//! assert_eq!(ev.index, Some(3));
//! assert_eq!((ev.running, ev.queued), (2, 5));
//! ```

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::core::SlotStatus;

/// Classification of trace events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceKind {
    /// A task left the ready queue and started executing.
    ///
    /// Sets: `index`, `running` (after increment), `queued` (after dequeue).
    Admit,

    /// A task reached a terminal state.
    ///
    /// Sets: `index`, `status`, `attempt` (attempts made), `running` (after release),
    /// `queued`, `reason` (error text, rejected only).
    Settle,

    /// A failed attempt will be retried after a delay.
    ///
    /// Sets: `index`, `attempt` (the attempt that failed), `delay_ms`, `reason`.
    RetryScheduled,

    /// An attempt exceeded the configured deadline and was abandoned.
    ///
    /// Sets: `index`, `attempt`, `timeout_ms`.
    TimeoutHit,

    /// A subscriber dropped an event (queue full or worker gone).
    ///
    /// Sets: `subscriber`, `reason`.
    SubscriberOverflow,

    /// A subscriber panicked while handling an event.
    ///
    /// Sets: `subscriber`, `reason` (panic message).
    SubscriberPanicked,
}

impl TraceKind {
    /// Returns a short stable label (snake_case).
    pub fn as_label(&self) -> &'static str {
        match self {
            TraceKind::Admit => "admit",
            TraceKind::Settle => "settle",
            TraceKind::RetryScheduled => "retry_scheduled",
            TraceKind::TimeoutHit => "timeout_hit",
            TraceKind::SubscriberOverflow => "subscriber_overflow",
            TraceKind::SubscriberPanicked => "subscriber_panicked",
        }
    }
}

/// Trace event with optional metadata.
///
/// `seq` is stamped by the [`Bus`](crate::Bus) that publishes the event and
/// increases monotonically per scheduler.
#[derive(Debug, Clone)]
pub struct TraceEvent {
    /// Per-bus sequence number (0 until published).
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: TraceKind,
    /// Submission index of the task, if applicable.
    pub index: Option<usize>,
    /// Tasks executing when the event was produced.
    pub running: usize,
    /// Tasks waiting in the ready queue when the event was produced.
    pub queued: usize,
    /// Attempt number (starting from 1).
    pub attempt: Option<u32>,
    /// Retry delay in milliseconds.
    pub delay_ms: Option<u32>,
    /// Attempt deadline in milliseconds.
    pub timeout_ms: Option<u32>,
    /// Terminal status (settle events only).
    pub status: Option<SlotStatus>,
    /// Human-readable reason (errors, overflow details, panic info).
    pub reason: Option<Arc<str>>,
    /// Subscriber name (subscriber events only).
    pub subscriber: Option<&'static str>,
}

impl TraceEvent {
    /// Creates an event of the given kind with the current timestamp.
    pub fn new(kind: TraceKind) -> Self {
        Self {
            seq: 0,
            at: SystemTime::now(),
            kind,
            index: None,
            running: 0,
            queued: 0,
            attempt: None,
            delay_ms: None,
            timeout_ms: None,
            status: None,
            reason: None,
            subscriber: None,
        }
    }

    /// Attaches the task's submission index.
    #[inline]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Attaches the gate gauges.
    #[inline]
    pub fn with_gauges(mut self, running: usize, queued: usize) -> Self {
        self.running = running;
        self.queued = queued;
        self
    }

    /// Attaches an attempt number.
    #[inline]
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    /// Attaches a retry delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(millis_u32(d));
        self
    }

    /// Attaches an attempt deadline (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(millis_u32(d));
        self
    }

    /// Attaches a terminal status.
    #[inline]
    pub fn with_status(mut self, status: SlotStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        let mut ev = TraceEvent::new(TraceKind::SubscriberOverflow).with_reason(reason);
        ev.subscriber = Some(subscriber);
        ev
    }

    /// Creates a subscriber panic event.
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        let mut ev = TraceEvent::new(TraceKind::SubscriberPanicked).with_reason(info);
        ev.subscriber = Some(subscriber);
        ev
    }

    /// Returns `true` for events describing subscriber health rather than tasks.
    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            TraceKind::SubscriberOverflow | TraceKind::SubscriberPanicked
        )
    }
}

fn millis_u32(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}
