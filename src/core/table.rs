//! # Ordered result table.
//!
//! Index-addressable outcome storage. Slot `i` belongs to the `i`-th task
//! submitted since the table was last cleared, whatever order tasks finish in.
//!
//! ## Rules
//! - Between clears the table only grows; slots are never removed or reordered.
//! - [`clear`](ResultTable::clear) is refused while any slot is `Pending`.
//! - The first terminal write to a slot wins; later writes are refused.
//! - Snapshots never mutate the table.

use std::ops::Range;

use super::slot::{ResultSlot, SlotStatus};

pub(crate) struct ResultTable<T> {
    slots: Vec<ResultSlot<T>>,
    fulfilled: usize,
    rejected: usize,
}

impl<T> ResultTable<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            fulfilled: 0,
            rejected: 0,
        }
    }

    /// Appends `n` pending slots and returns their index range.
    pub fn reserve(&mut self, n: usize) -> Range<usize> {
        let start = self.slots.len();
        self.slots
            .extend(std::iter::repeat_with(|| ResultSlot::Pending).take(n));
        start..self.slots.len()
    }

    /// Drops every slot so the next reservation starts at index 0.
    ///
    /// Returns `false` and leaves the table untouched while a slot is `Pending`.
    pub fn clear(&mut self) -> bool {
        if self.pending() > 0 {
            return false;
        }
        self.slots.clear();
        self.fulfilled = 0;
        self.rejected = 0;
        true
    }

    /// Appends one pending slot and returns its index.
    pub fn push(&mut self) -> usize {
        self.reserve(1).start
    }

    /// Writes a terminal outcome into slot `index`.
    ///
    /// Returns `false` if the index is unknown, `slot` is `Pending`, or the slot
    /// already holds a terminal outcome.
    pub fn settle(&mut self, index: usize, slot: ResultSlot<T>) -> bool {
        let status = slot.status();
        match self.slots.get_mut(index) {
            Some(current) if !current.is_settled() && status != SlotStatus::Pending => {
                *current = slot;
                match status {
                    SlotStatus::Fulfilled => self.fulfilled += 1,
                    SlotStatus::Rejected => self.rejected += 1,
                    SlotStatus::Pending => {}
                }
                true
            }
            _ => false,
        }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&ResultSlot<T>> {
        self.slots.get(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn fulfilled(&self) -> usize {
        self.fulfilled
    }

    #[inline]
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    #[inline]
    pub fn pending(&self) -> usize {
        self.slots.len() - self.fulfilled - self.rejected
    }
}

impl<T: Clone> ResultTable<T> {
    /// Copies every slot, in submission order.
    pub fn snapshot(&self) -> Vec<ResultSlot<T>> {
        self.slots.clone()
    }

    /// Copies the slots in `range`; indices past the end are skipped.
    pub fn window(&self, range: Range<usize>) -> Vec<ResultSlot<T>> {
        let end = range.end.min(self.slots.len());
        let start = range.start.min(end);
        self.slots[start..end].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;

    #[test]
    fn test_reserve_appends_pending_slots() {
        let mut table: ResultTable<u32> = ResultTable::new();
        assert_eq!(table.reserve(3), 0..3);
        assert_eq!(table.push(), 3);
        assert_eq!(table.reserve(0), 4..4);
        assert_eq!(table.len(), 4);
        assert!(table.snapshot().iter().all(|s| *s == ResultSlot::Pending));
    }

    #[test]
    fn test_out_of_order_settlement_keeps_positions() {
        let mut table = ResultTable::new();
        table.reserve(3);
        assert!(table.settle(1, ResultSlot::Fulfilled("B")));
        assert!(table.settle(2, ResultSlot::Fulfilled("C")));
        assert!(table.settle(0, ResultSlot::Fulfilled("A")));

        let values: Vec<_> = table.snapshot().into_iter().filter_map(|s| s.value().copied()).collect();
        assert_eq!(values, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_first_terminal_write_wins() {
        let mut table = ResultTable::new();
        table.reserve(1);
        let timeout = TaskError::Timeout {
            timeout: std::time::Duration::from_millis(500),
        };
        assert!(table.settle(0, ResultSlot::Rejected(timeout.clone())));
        assert!(!table.settle(0, ResultSlot::Fulfilled(42)));
        assert_eq!(table.get(0), Some(&ResultSlot::Rejected(timeout)));
        assert_eq!((table.fulfilled(), table.rejected()), (0, 1));
    }

    #[test]
    fn test_pending_and_unknown_writes_are_refused() {
        let mut table: ResultTable<u8> = ResultTable::new();
        table.reserve(1);
        assert!(!table.settle(0, ResultSlot::Pending));
        assert!(!table.settle(5, ResultSlot::Fulfilled(1)));
        assert_eq!(table.get(0), Some(&ResultSlot::Pending));
    }

    #[test]
    fn test_clear_waits_for_pending_slots() {
        let mut table = ResultTable::new();
        table.reserve(2);
        table.settle(0, ResultSlot::Fulfilled("a"));
        assert_eq!(table.pending(), 1);
        assert!(!table.clear());
        assert_eq!(table.len(), 2);

        table.settle(1, ResultSlot::Rejected(TaskError::fail("b")));
        assert!(table.clear());
        assert_eq!((table.len(), table.fulfilled(), table.rejected()), (0, 0, 0));
        assert_eq!(table.reserve(1), 0..1);
    }

    #[test]
    fn test_window_is_clamped() {
        let mut table = ResultTable::new();
        table.reserve(2);
        table.settle(1, ResultSlot::Fulfilled(9));
        assert_eq!(table.window(1..5), vec![ResultSlot::Fulfilled(9)]);
        assert!(table.window(4..6).is_empty());
    }
}
