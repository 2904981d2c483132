//! # Result slots.
//!
//! One [`ResultSlot`] exists per submitted task, addressed by submission index.
//! A slot starts `Pending` and is written **once** with a terminal outcome.

use crate::error::TaskError;

/// Outcome stored for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultSlot<T> {
    /// Not settled yet (queued, running, or waiting to retry).
    Pending,
    /// The task produced a value.
    Fulfilled(T),
    /// The task failed after exhausting its retries, timed out, or panicked.
    Rejected(TaskError),
}

/// Status of a slot without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotStatus {
    /// No terminal outcome yet.
    Pending,
    /// Terminal: value available.
    Fulfilled,
    /// Terminal: error available.
    Rejected,
}

impl<T> ResultSlot<T> {
    /// Returns the status of this slot.
    pub fn status(&self) -> SlotStatus {
        match self {
            ResultSlot::Pending => SlotStatus::Pending,
            ResultSlot::Fulfilled(_) => SlotStatus::Fulfilled,
            ResultSlot::Rejected(_) => SlotStatus::Rejected,
        }
    }

    /// Returns `true` once the slot holds a terminal outcome.
    #[inline]
    pub fn is_settled(&self) -> bool {
        !matches!(self, ResultSlot::Pending)
    }

    /// Returns the value if fulfilled.
    pub fn value(&self) -> Option<&T> {
        match self {
            ResultSlot::Fulfilled(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the error if rejected.
    pub fn error(&self) -> Option<&TaskError> {
        match self {
            ResultSlot::Rejected(e) => Some(e),
            _ => None,
        }
    }

    /// Converts a terminal slot back into a `Result`; `None` while pending.
    pub fn into_result(self) -> Option<Result<T, TaskError>> {
        match self {
            ResultSlot::Pending => None,
            ResultSlot::Fulfilled(v) => Some(Ok(v)),
            ResultSlot::Rejected(e) => Some(Err(e)),
        }
    }
}

impl<T> From<Result<T, TaskError>> for ResultSlot<T> {
    fn from(res: Result<T, TaskError>) -> Self {
        match res {
            Ok(v) => ResultSlot::Fulfilled(v),
            Err(e) => ResultSlot::Rejected(e),
        }
    }
}

/// A slot tagged with the submission index it belongs to.
///
/// Returned by [`Scheduler::add`](crate::Scheduler::add).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedSlot<T> {
    /// Position of the task in the scheduler's result table.
    pub index: usize,
    /// The task's outcome.
    pub slot: ResultSlot<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_accessors() {
        let ok: ResultSlot<&str> = Ok("y").into();
        assert_eq!(ok.status(), SlotStatus::Fulfilled);
        assert_eq!(ok.value(), Some(&"y"));
        assert!(ok.error().is_none());

        let err: ResultSlot<&str> = Err(TaskError::fail("x")).into();
        assert_eq!(err.status(), SlotStatus::Rejected);
        assert_eq!(err.error(), Some(&TaskError::fail("x")));

        let pending: ResultSlot<&str> = ResultSlot::Pending;
        assert!(!pending.is_settled());
        assert_eq!(pending.into_result(), None);
    }
}
