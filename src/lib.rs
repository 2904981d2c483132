//! # taskgate
//!
//! **Taskgate** is a bounded-concurrency async task scheduler for Rust.
//!
//! Submit a batch (or single tasks) of async executors; at most
//! `max_concurrency` of them run at any instant, each attempt may be bounded
//! by a deadline and retried with backoff, and every outcome lands in a result
//! table slot matching the task's **submission** order, whatever order the
//! tasks finish in.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   TaskRef    │   │   TaskRef    │   │   TaskRef    │
//!     │  (index 0)   │   │  (index 1)   │   │  (index 2)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Scheduler                                                        │
//! │  - ConcurrencyGate (FIFO ready queue, running ≤ max_concurrency)  │
//! │  - ResultTable (slot i ↔ i-th submitted task)                     │
//! │  - CompletionTracker per run() batch                              │
//! │  - Bus (trace events, debug mode)                                 │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │ RetryPolicy  │   │ RetryPolicy  │   │  (queued)    │   │
//!     │ TimeoutGuard │   │ TimeoutGuard │   │              │   │
//!     └┬─────────────┘   └┬─────────────┘   └──────────────┘   │
//!      │ settle           │ settle                             │
//!      ▼                  ▼                                    ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │             Bus (broadcast channel, debug mode only)              │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                         subscriber listener
//!                                   ▼
//!                             SubscriberSet
//!                        ┌──────────┼──────────┐
//!                        ▼          ▼          ▼
//!                     worker1    worker2    workerN
//! ```
//!
//! ### Lifecycle of one task
//! ```text
//! Pending(queued) ──admit──► Running ──┬─ Ok(v)               ──► Fulfilled(v)
//!                                      ├─ Err(e), retries left ──► sleep(backoff), attempt again
//!                                      └─ Err(e), exhausted    ──► Rejected(e)
//! ```
//!
//! ## Features
//! | Area              | Description                                                | Key types / traits                        |
//! |-------------------|------------------------------------------------------------|-------------------------------------------|
//! | **Scheduling**    | Bounded concurrency, ordered results, batch and single add | [`Scheduler`], [`RunHandle`], [`SlotHandle`] |
//! | **Results**       | Per-task outcome slots, failures never abort siblings      | [`ResultSlot`], [`IndexedSlot`]           |
//! | **Policies**      | Retry limit, backoff and jitter                            | [`RetryPolicy`], [`BackoffPolicy`]        |
//! | **Subscriber API**| Hook into admit/settle/retry trace events                  | [`Subscribe`], [`TraceEvent`]             |
//! | **Errors**        | Typed errors for configuration and task execution          | [`TaskError`], [`ConfigError`]            |
//! | **Tasks**         | Define tasks as closures or trait objects                  | [`TaskRef`], [`TaskFn`], [`Task`]         |
//! | **Configuration** | Centralize scheduler settings                              | [`SchedulerConfig`]                       |
//!
//! ## Optional features
//! - `logging`: exports a built-in [`LogWriter`] that forwards trace events to `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use taskgate::{ResultSlot, Scheduler, SchedulerConfig, TaskError, TaskFn, TaskRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = SchedulerConfig::default()
//!         .with_max_concurrency(2)
//!         .with_timeout(Duration::from_secs(5))
//!         .with_retry_limit(1);
//!
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn taskgate::Subscribe>> = vec![Arc::new(taskgate::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn taskgate::Subscribe>> = Vec::new();
//!
//!     let scheduler: Scheduler<u64> = Scheduler::builder(cfg).with_subscribers(subs).build()?;
//!
//!     let tasks: Vec<TaskRef<u64>> = (1..=4u64)
//!         .map(|n| {
//!             TaskFn::arc(move |_ctx: CancellationToken| async move {
//!                 tokio::time::sleep(Duration::from_millis(10 * (5 - n))).await;
//!                 if n == 3 {
//!                     return Err(TaskError::fatal("three is not allowed"));
//!                 }
//!                 Ok(n * n)
//!             })
//!         })
//!         .collect();
//!
//!     let results = scheduler.run(tasks).await;
//!     assert_eq!(results[0], ResultSlot::Fulfilled(1));
//!     assert_eq!(results[1], ResultSlot::Fulfilled(4));
//!     assert!(results[2].error().is_some());
//!     assert_eq!(results[3], ResultSlot::Fulfilled(16));
//!
//!     // Late additions get the next free index.
//!     let late = scheduler.add(TaskFn::arc(|_ctx: CancellationToken| async { Ok(99) })).await;
//!     assert_eq!(late.index, 4);
//!     assert_eq!(scheduler.ordered_results().len(), 5);
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod policies;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use crate::core::{
    IndexedSlot, ResultSlot, RunHandle, Scheduler, SchedulerBuilder, SchedulerStats, SlotHandle,
    SlotStatus,
};
pub use config::SchedulerConfig;
pub use error::{ConfigError, TaskError};
pub use events::{Bus, TraceEvent, TraceKind};
pub use policies::{BackoffPolicy, JitterPolicy, RetryPolicy};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{Task, TaskFn, TaskRef};

// Optional: expose a built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
