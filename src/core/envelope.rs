//! # Task envelope: a submitted task plus its bookkeeping.
//!
//! ```text
//! Pending ──admit──► Running ──settle──► Fulfilled
//!                               └──────► Rejected
//! ```
//!
//! ## Rules
//! - `index` is assigned at submission and never changes.
//! - State only moves forward; a request to go back is refused.
//! - `attempts_used` counts retries of **this** envelope only.

use tokio::sync::oneshot;

use super::{
    slot::{IndexedSlot, SlotStatus},
    tracker::RunId,
};
use crate::{error::TaskError, policies::RetryPolicy, tasks::TaskRef};

/// Lifecycle of an envelope. Ordered: later variants are later states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum EnvelopeState {
    Pending,
    Running,
    Fulfilled,
    Rejected,
}

impl EnvelopeState {
    fn is_terminal(self) -> bool {
        matches!(self, EnvelopeState::Fulfilled | EnvelopeState::Rejected)
    }
}

impl From<SlotStatus> for EnvelopeState {
    fn from(status: SlotStatus) -> Self {
        match status {
            SlotStatus::Pending => EnvelopeState::Pending,
            SlotStatus::Fulfilled => EnvelopeState::Fulfilled,
            SlotStatus::Rejected => EnvelopeState::Rejected,
        }
    }
}

/// Where the envelope reports when it settles.
pub(crate) enum Origin<T> {
    /// Part of a `run()` batch; counts toward that batch's completion.
    Run(RunId),
    /// Submitted alone through `add()`; the outcome goes to this channel.
    Add(oneshot::Sender<IndexedSlot<T>>),
}

pub(crate) struct TaskEnvelope<T: Send + 'static> {
    index: usize,
    task: TaskRef<T>,
    attempts_used: u32,
    attempts_allowed: u32,
    state: EnvelopeState,
    origin: Origin<T>,
}

impl<T: Send + 'static> TaskEnvelope<T> {
    pub fn new(index: usize, task: TaskRef<T>, attempts_allowed: u32, origin: Origin<T>) -> Self {
        Self {
            index,
            task,
            attempts_used: 0,
            attempts_allowed,
            state: EnvelopeState::Pending,
            origin,
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn task(&self) -> &TaskRef<T> {
        &self.task
    }

    #[inline]
    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    /// 1-based number of the attempt currently being made.
    #[inline]
    pub fn attempt(&self) -> u32 {
        self.attempts_used + 1
    }

    #[inline]
    pub fn attempts_used(&self) -> u32 {
        self.attempts_used
    }

    #[cfg(test)]
    pub fn attempts_allowed(&self) -> u32 {
        self.attempts_allowed
    }

    /// Moves the envelope forward. Returns `false` (and changes nothing) for
    /// backward moves, same-state moves, or moves out of a terminal state.
    pub fn advance(&mut self, next: EnvelopeState) -> bool {
        if self.state.is_terminal() || next <= self.state {
            return false;
        }
        self.state = next;
        true
    }

    /// Consumes one retry if `policy` permits it for `err`.
    ///
    /// Returns the 0-based retry number that was consumed.
    pub fn consume_retry(&mut self, policy: &RetryPolicy, err: &TaskError) -> Option<u32> {
        if !policy.permits(self.attempts_used, self.attempts_allowed, err) {
            return None;
        }
        let retry = self.attempts_used;
        self.attempts_used += 1;
        Some(retry)
    }

    /// Splits off the reporting target; the envelope is done after this.
    pub fn into_origin(self) -> Origin<T> {
        self.origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{policies::BackoffPolicy, tasks::TaskFn};
    use tokio_util::sync::CancellationToken;

    fn envelope(allowed: u32) -> TaskEnvelope<u8> {
        let task: TaskRef<u8> = TaskFn::arc(|_ctx: CancellationToken| async { Ok(1) });
        TaskEnvelope::new(0, task, allowed, Origin::Run(RunId::new(0)))
    }

    #[test]
    fn test_state_is_monotonic() {
        let mut env = envelope(0);
        assert_eq!(env.state(), EnvelopeState::Pending);
        assert!(env.advance(EnvelopeState::Running));
        assert!(!env.advance(EnvelopeState::Pending));
        assert!(!env.advance(EnvelopeState::Running));
        assert!(env.advance(EnvelopeState::Rejected));
        assert!(!env.advance(EnvelopeState::Fulfilled));
        assert_eq!(env.state(), EnvelopeState::Rejected);
    }

    #[test]
    fn test_fulfilled_is_final() {
        let mut env = envelope(0);
        assert!(env.advance(EnvelopeState::Running));
        assert!(env.advance(EnvelopeState::Fulfilled));
        assert!(!env.advance(EnvelopeState::Rejected));
    }

    #[test]
    fn test_retry_budget_is_per_envelope() {
        let policy = RetryPolicy::new(2, BackoffPolicy::immediate());
        let mut a = envelope(2);
        let mut b = envelope(2);
        let err = TaskError::fail("x");

        assert_eq!(a.consume_retry(&policy, &err), Some(0));
        assert_eq!(a.consume_retry(&policy, &err), Some(1));
        assert_eq!(a.consume_retry(&policy, &err), None);
        assert_eq!(a.attempt(), 3);

        assert_eq!(b.attempts_used(), 0);
        assert_eq!(b.consume_retry(&policy, &err), Some(0));
    }

    #[test]
    fn test_non_retryable_error_keeps_budget() {
        let policy = RetryPolicy::new(2, BackoffPolicy::immediate());
        let mut env = envelope(3);
        assert_eq!(env.consume_retry(&policy, &TaskError::fatal("no")), None);
        assert_eq!(env.attempts_used(), 0);
        assert_eq!(env.attempts_allowed(), 3);
    }
}
