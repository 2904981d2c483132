//! Scheduler core: admission, execution, and ordered result storage.
//!
//! The only public types from this module are the [`Scheduler`] facade, its
//! builder, the handles it returns, and the result slot types.
//!
//! Internal modules:
//! - [`gate`]: FIFO ready queue and the running counter (admission control);
//! - [`envelope`]: per-task bookkeeping (index, attempts, lifecycle state);
//! - [`table`]: index-addressable outcome storage;
//! - [`tracker`]: completion detection for `run()` batches;
//! - [`guard`]: one attempt raced against the deadline;
//! - [`runner`]: retry loop around the guard.

mod builder;
mod envelope;
mod gate;
mod guard;
mod handle;
mod runner;
mod scheduler;
mod slot;
mod stats;
mod table;
mod tracker;

pub use builder::SchedulerBuilder;
pub use handle::{RunHandle, SlotHandle};
pub use scheduler::Scheduler;
pub use slot::{IndexedSlot, ResultSlot, SlotStatus};
pub use stats::SchedulerStats;
