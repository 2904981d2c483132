//! # Awaitable handles returned by `run()` and `add()`.
//!
//! Both handles are plain futures over a oneshot carrying the outcome. The work
//! is already queued when a handle is created; dropping a handle never
//! cancels anything, the outcome simply stays in the result table.

use std::future::Future;
use std::ops::Range;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use super::{
    scheduler::Shared,
    slot::{IndexedSlot, ResultSlot},
};

/// Resolves to the ordered outcomes of one `run()` batch.
///
/// The output is the batch's own window of the result table, copied when the
/// last task settled: element `i` is the outcome of the batch's `i`-th task,
/// with no `Pending` entries. A later `run()` that clears the table does not
/// change it.
#[must_use = "a run handle does nothing unless awaited; the tasks run regardless"]
pub struct RunHandle<T: Clone + Send + 'static> {
    shared: Arc<Shared<T>>,
    range: Range<usize>,
    done: oneshot::Receiver<Vec<ResultSlot<T>>>,
}

impl<T: Clone + Send + 'static> RunHandle<T> {
    pub(super) fn new(
        shared: Arc<Shared<T>>,
        range: Range<usize>,
        done: oneshot::Receiver<Vec<ResultSlot<T>>>,
    ) -> Self {
        Self { shared, range, done }
    }

    /// Result-table indices owned by this batch.
    pub fn indices(&self) -> Range<usize> {
        self.range.clone()
    }
}

impl<T: Clone + Send + 'static> Future for RunHandle<T> {
    type Output = Vec<ResultSlot<T>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.done).poll(cx) {
            Poll::Ready(Ok(slots)) => Poll::Ready(slots),
            // A closed channel can only mean the tracker is gone; fall back to the table.
            Poll::Ready(Err(_)) => Poll::Ready(this.shared.window(this.range.clone())),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Resolves to the settled slot of one `add()` task.
#[must_use = "a slot handle does nothing unless awaited; the task runs regardless"]
pub struct SlotHandle<T: Clone + Send + 'static> {
    shared: Arc<Shared<T>>,
    index: usize,
    done: oneshot::Receiver<IndexedSlot<T>>,
}

impl<T: Clone + Send + 'static> SlotHandle<T> {
    pub(super) fn new(shared: Arc<Shared<T>>, index: usize, done: oneshot::Receiver<IndexedSlot<T>>) -> Self {
        Self { shared, index, done }
    }

    /// Result-table index assigned to the task.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl<T: Clone + Send + 'static> Future for SlotHandle<T> {
    type Output = IndexedSlot<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.done).poll(cx) {
            Poll::Ready(Ok(slot)) => Poll::Ready(slot),
            Poll::Ready(Err(_)) => Poll::Ready(IndexedSlot {
                index: this.index,
                slot: this.shared.slot(this.index),
            }),
            Poll::Pending => Poll::Pending,
        }
    }
}
