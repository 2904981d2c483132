//! # Concurrency gate: admission control.
//!
//! Holds the FIFO ready queue and the count of executing envelopes.
//!
//! ```text
//! submit(env) ──► [ready queue] ──admit_next()──► running (≤ ceiling)
//!                                                   │
//!                                   release() ◄─────┘ on settlement
//! ```
//!
//! ## Rules
//! - `running` never exceeds `ceiling`.
//! - Start order is FIFO; completion order is whatever the tasks do.
//! - The gate does no I/O and runs no user code; callers hold the scheduler
//!   lock around it, so admissions can't interleave.

use std::collections::VecDeque;

use super::envelope::{EnvelopeState, TaskEnvelope};

pub(crate) struct ConcurrencyGate<T: Send + 'static> {
    ready: VecDeque<TaskEnvelope<T>>,
    running: usize,
    peak: usize,
    ceiling: usize,
}

impl<T: Send + 'static> ConcurrencyGate<T> {
    /// Creates a gate admitting at most `ceiling` envelopes at once (minimum 1).
    pub fn new(ceiling: usize) -> Self {
        Self {
            ready: VecDeque::new(),
            running: 0,
            peak: 0,
            ceiling: ceiling.max(1),
        }
    }

    /// Appends an envelope to the ready queue.
    pub fn submit(&mut self, envelope: TaskEnvelope<T>) {
        self.ready.push_back(envelope);
    }

    /// Dequeues the next envelope if there is room, marking it running.
    pub fn admit_next(&mut self) -> Option<TaskEnvelope<T>> {
        if self.running >= self.ceiling {
            return None;
        }
        let mut envelope = self.ready.pop_front()?;
        envelope.advance(EnvelopeState::Running);
        self.running += 1;
        self.peak = self.peak.max(self.running);
        Some(envelope)
    }

    /// Frees the slot held by a settled envelope.
    pub fn release(&mut self) {
        debug_assert!(self.running > 0, "release without matching admission");
        self.running = self.running.saturating_sub(1);
    }

    #[inline]
    pub fn running(&self) -> usize {
        self.running
    }

    #[inline]
    pub fn queued(&self) -> usize {
        self.ready.len()
    }

    /// Highest `running` value observed since the gate was created.
    #[inline]
    pub fn peak(&self) -> usize {
        self.peak
    }

    #[cfg(test)]
    pub fn ceiling(&self) -> usize {
        self.ceiling
    }
}
