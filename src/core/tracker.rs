//! # Completion tracking for `run()` batches.
//!
//! Each `run()` call owns one [`CompletionTracker`] with a fixed target: the
//! number of tasks in that batch. Envelopes submitted through `add()` never
//! touch a tracker, so they cannot delay or prematurely finish a batch.
//!
//! On completion the tracker copies the batch's window out of the result
//! table and hands it to the run handle, so a later `run()` that clears the
//! table cannot change what an earlier batch resolves to.
//!
//! ## Rules
//! - Fires **exactly once**, when `settled == total`.
//! - Never fires early: `settled` only moves on terminal transitions.
//! - A batch of zero tasks is complete from the start.

use std::ops::Range;

use tokio::sync::oneshot;

use super::{slot::ResultSlot, table::ResultTable};

/// Identifies one `run()` batch within a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct RunId(u64);

impl RunId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns this id and advances `self` to the next one.
    pub fn bump(&mut self) -> RunId {
        let id = *self;
        self.0 += 1;
        id
    }
}

pub(crate) struct CompletionTracker<T> {
    window: Range<usize>,
    settled: usize,
    done: Option<oneshot::Sender<Vec<ResultSlot<T>>>>,
}

impl<T: Clone> CompletionTracker<T> {
    /// Tracks the batch occupying `window`; an empty window fires immediately.
    pub fn new(window: Range<usize>, done: oneshot::Sender<Vec<ResultSlot<T>>>) -> Self {
        let mut tracker = Self {
            window,
            settled: 0,
            done: Some(done),
        };
        if tracker.is_complete() {
            tracker.fire(Vec::new());
        }
        tracker
    }

    /// Records one terminal transition. Returns `true` if this completed the batch.
    pub fn record_settled(&mut self, table: &ResultTable<T>) -> bool {
        if self.is_complete() {
            return false;
        }
        self.settled += 1;
        if !self.is_complete() {
            return false;
        }
        self.fire(table.window(self.window.clone()))
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.settled >= self.window.len()
    }

    #[cfg(test)]
    pub fn remaining(&self) -> usize {
        self.window.len() - self.settled.min(self.window.len())
    }

    fn fire(&mut self, slots: Vec<ResultSlot<T>>) -> bool {
        match self.done.take() {
            Some(tx) => {
                // The receiver may be gone if the caller dropped the run handle.
                let _ = tx.send(slots);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_at_target() {
        let mut table = ResultTable::new();
        let window = table.reserve(3);
        let (tx, mut rx) = oneshot::channel();
        let mut tracker = CompletionTracker::new(window, tx);

        table.settle(2, ResultSlot::Fulfilled(3));
        assert!(!tracker.record_settled(&table));
        table.settle(0, ResultSlot::Fulfilled(1));
        assert!(!tracker.record_settled(&table));
        assert!(rx.try_recv().is_err());
        assert_eq!(tracker.remaining(), 1);

        table.settle(1, ResultSlot::Fulfilled(2));
        assert!(tracker.record_settled(&table));
        assert_eq!(
            rx.try_recv().ok(),
            Some(vec![ResultSlot::Fulfilled(1), ResultSlot::Fulfilled(2), ResultSlot::Fulfilled(3)])
        );

        assert!(!tracker.record_settled(&table));
        assert_eq!(tracker.remaining(), 0);
    }

    #[test]
    fn test_sends_only_its_own_window() {
        let mut table = ResultTable::new();
        table.reserve(1);
        let window = table.reserve(1);
        table.push();
        let (tx, mut rx) = oneshot::channel();
        let mut tracker = CompletionTracker::new(window, tx);

        table.settle(1, ResultSlot::Fulfilled("mine"));
        table.settle(2, ResultSlot::Fulfilled("late add"));
        assert!(tracker.record_settled(&table));
        assert_eq!(rx.try_recv().ok(), Some(vec![ResultSlot::Fulfilled("mine")]));
    }

    #[test]
    fn test_empty_batch_is_complete_immediately() {
        let (tx, mut rx) = oneshot::channel::<Vec<ResultSlot<u8>>>();
        let tracker = CompletionTracker::new(4..4, tx);
        assert!(tracker.is_complete());
        assert_eq!(rx.try_recv().ok(), Some(Vec::new()));
    }

    #[test]
    fn test_dropped_receiver_does_not_panic() {
        let mut table = ResultTable::new();
        let window = table.reserve(1);
        let (tx, rx) = oneshot::channel();
        drop(rx);
        let mut tracker = CompletionTracker::new(window, tx);
        table.settle(0, ResultSlot::Fulfilled(()));
        assert!(tracker.record_settled(&table));
    }

    #[test]
    fn test_run_ids_advance() {
        let mut next = RunId::new(7);
        assert_eq!(next.bump(), RunId::new(7));
        assert_eq!(next.bump(), RunId::new(8));
    }
}
