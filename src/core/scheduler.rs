//! # Scheduler: bounded-concurrency execution with ordered results.
//!
//! The [`Scheduler`] owns one [`ConcurrencyGate`](super::gate), one result
//! table, and the completion trackers of its `run()` batches. All of that
//! bookkeeping lives behind a single instance-owned mutex that is only held
//! for short synchronous sections (never across an `.await`, never while user
//! code runs), so admit/settle steps are atomic with respect to each other.
//!
//! ## Admit → run → settle → admit
//! ```text
//! run(tasks) / add(task)
//!   └─► [run() on an idle scheduler: table.clear()]
//!       table.reserve()  +  gate.submit(envelope)  ──► pump()
//!
//! pump():
//!   lock { while let Some(env) = gate.admit_next() { publish Admit } }
//!   └─► tokio::spawn(drive(env)) for each admitted envelope
//!
//! drive(env):
//!   outcome = runner::execute(env)          (retry → timeout guard → task)
//!   lock {
//!     table.settle(index, outcome)          (first terminal write wins)
//!     gate.release()
//!     tracker.record_settled(table) / reply to add()
//!     publish Settle
//!   }
//!   pump()                                   (admit the next envelope)
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use taskgate::{Scheduler, SchedulerConfig, TaskError, TaskFn, TaskRef};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let scheduler = Scheduler::new(SchedulerConfig::default().with_max_concurrency(2))?;
//!
//! let tasks: Vec<TaskRef<&'static str>> = vec![
//!     TaskFn::arc(|_ctx: CancellationToken| async {
//!         tokio::time::sleep(Duration::from_millis(20)).await;
//!         Ok("slow")
//!     }),
//!     TaskFn::arc(|_ctx: CancellationToken| async { Ok("fast") }),
//!     TaskFn::arc(|_ctx: CancellationToken| async { Err(TaskError::fail("broken")) }),
//! ];
//!
//! let results = scheduler.run(tasks).await;
//! assert_eq!(results[0].value(), Some(&"slow"));
//! assert_eq!(results[1].value(), Some(&"fast"));
//! assert_eq!(results[2].error(), Some(&TaskError::fail("broken")));
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, oneshot};
use tokio_util::sync::{CancellationToken, DropGuard};

use super::{
    builder::SchedulerBuilder,
    envelope::{EnvelopeState, Origin, TaskEnvelope},
    gate::ConcurrencyGate,
    handle::{RunHandle, SlotHandle},
    runner::{self, RunnerParams},
    slot::{IndexedSlot, ResultSlot},
    stats::SchedulerStats,
    table::ResultTable,
    tracker::{CompletionTracker, RunId},
};
use crate::{
    config::SchedulerConfig,
    error::{ConfigError, TaskError},
    events::{Bus, TraceEvent, TraceKind},
    tasks::TaskRef,
};

/// Bounded-concurrency scheduler with submission-ordered results.
///
/// Cloning is cheap and yields another handle to the **same** scheduler.
/// Dropping the last clone cancels the tokens handed to running attempts and
/// aborts pending retry waits; handles already returned still resolve.
///
/// ### Rules
/// - At most `max_concurrency` tasks execute at any instant.
/// - Slot `i` of the result table belongs to the `i`-th task submitted since
///   the last `run()` that found the scheduler idle.
/// - A task's failure is recorded in its slot and never aborts other tasks.
/// - `run()` and `add()` must be called from within a Tokio runtime.
pub struct Scheduler<T: Clone + Send + 'static> {
    shared: Arc<Shared<T>>,
    lifeline: Arc<DropGuard>,
}

impl<T: Clone + Send + 'static> Clone for Scheduler<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            lifeline: Arc::clone(&self.lifeline),
        }
    }
}

pub(super) struct Shared<T: Clone + Send + 'static> {
    cfg: SchedulerConfig,
    params: RunnerParams,
    bus: Bus,
    runtime_token: CancellationToken,
    state: Mutex<State<T>>,
}

struct State<T: Clone + Send + 'static> {
    gate: ConcurrencyGate<T>,
    table: ResultTable<T>,
    runs: HashMap<RunId, CompletionTracker<T>>,
    next_run: RunId,
}

impl<T: Clone + Send + 'static> Scheduler<T> {
    /// Creates a scheduler with no subscribers.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the concurrency range is invalid.
    pub fn new(cfg: SchedulerConfig) -> Result<Self, ConfigError> {
        Self::builder(cfg).build()
    }

    /// Returns a builder for attaching subscribers.
    pub fn builder(cfg: SchedulerConfig) -> SchedulerBuilder<T> {
        SchedulerBuilder::new(cfg)
    }

    pub(super) fn from_parts(cfg: SchedulerConfig, bus: Bus, runtime_token: CancellationToken) -> Self {
        let params = RunnerParams {
            retry: cfg.retry_policy(),
            timeout: cfg.attempt_timeout(),
            trace: cfg.debug.then(|| bus.clone()),
        };
        let state = State {
            gate: ConcurrencyGate::new(cfg.concurrency_ceiling()),
            table: ResultTable::new(),
            runs: HashMap::new(),
            next_run: RunId::new(0),
        };
        Self {
            lifeline: Arc::new(runtime_token.clone().drop_guard()),
            shared: Arc::new(Shared {
                cfg,
                params,
                bus,
                runtime_token,
                state: Mutex::new(state),
            }),
        }
    }

    /// Submits a batch and returns a future for the batch's ordered results.
    ///
    /// The batch occupies a contiguous block of the result table; element `i`
    /// of the resolved vector is the outcome of `tasks[i]`. The future never
    /// fails: per-task errors are `Rejected` slots. An empty batch resolves
    /// immediately with an empty vector.
    ///
    /// If nothing is running, queued, or pending, the result table is cleared
    /// first and the batch starts at index 0. Otherwise the batch is appended
    /// after the work still in flight.
    ///
    /// Tasks are queued when this is called, not when the future is first polled.
    pub fn run<I>(&self, tasks: I) -> RunHandle<T>
    where
        I: IntoIterator<Item = TaskRef<T>>,
    {
        let tasks: Vec<TaskRef<T>> = tasks.into_iter().collect();
        let (tx, rx) = oneshot::channel();
        let allowed = self.shared.params.retry.limit;

        let range = {
            let mut state = self.shared.lock();
            if state.gate.running() == 0 && state.gate.queued() == 0 {
                state.table.clear();
            }
            let range = state.table.reserve(tasks.len());
            let run = state.next_run.bump();
            let tracker = CompletionTracker::new(range.clone(), tx);
            if !tracker.is_complete() {
                state.runs.insert(run, tracker);
            }
            for (index, task) in range.clone().zip(tasks) {
                state
                    .gate
                    .submit(TaskEnvelope::new(index, task, allowed, Origin::Run(run)));
            }
            range
        };

        self.shared.pump();
        RunHandle::new(Arc::clone(&self.shared), range, rx)
    }

    /// Appends one task with the next free index and returns a future for its slot.
    ///
    /// Works before, during, or after any `run()`; existing slots are untouched
    /// and the task does not count toward any `run()` batch.
    pub fn add(&self, task: TaskRef<T>) -> SlotHandle<T> {
        let (tx, rx) = oneshot::channel();
        let allowed = self.shared.params.retry.limit;

        let index = {
            let mut state = self.shared.lock();
            let index = state.table.push();
            state
                .gate
                .submit(TaskEnvelope::new(index, task, allowed, Origin::Add(tx)));
            index
        };

        self.shared.pump();
        SlotHandle::new(Arc::clone(&self.shared), index, rx)
    }

    /// Returns every slot in submission order; unsettled tasks are `Pending`.
    ///
    /// Synchronous and read-only.
    pub fn ordered_results(&self) -> Vec<ResultSlot<T>> {
        self.shared.lock().table.snapshot()
    }

    /// Returns the slot at `index`, if that many tasks have been submitted.
    pub fn result(&self, index: usize) -> Option<ResultSlot<T>> {
        self.shared.lock().table.get(index).cloned()
    }

    /// Number of tasks executing right now.
    pub fn running(&self) -> usize {
        self.shared.lock().gate.running()
    }

    /// Number of tasks waiting for admission.
    pub fn queued(&self) -> usize {
        self.shared.lock().gate.queued()
    }

    /// Point-in-time counters.
    pub fn stats(&self) -> SchedulerStats {
        let state = self.shared.lock();
        SchedulerStats {
            submitted: state.table.len(),
            running: state.gate.running(),
            queued: state.gate.queued(),
            peak_running: state.gate.peak(),
            fulfilled: state.table.fulfilled(),
            rejected: state.table.rejected(),
        }
    }

    /// Receiver for trace events published after this call.
    ///
    /// Events are only published when [`SchedulerConfig::debug`] is set.
    pub fn subscribe(&self) -> broadcast::Receiver<TraceEvent> {
        self.shared.bus.subscribe()
    }

    /// Configuration this scheduler was built with.
    pub fn config(&self) -> &SchedulerConfig {
        &self.shared.cfg
    }
}

impl<T: Clone + Send + 'static> Shared<T> {
    /// Locks the bookkeeping state.
    ///
    /// No user code runs under this lock, so a poisoned lock still guards
    /// consistent data and is recovered.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn window(&self, range: std::ops::Range<usize>) -> Vec<ResultSlot<T>> {
        self.lock().table.window(range)
    }

    pub(super) fn slot(&self, index: usize) -> ResultSlot<T> {
        self.lock()
            .table
            .get(index)
            .cloned()
            .unwrap_or(ResultSlot::Pending)
    }

    fn trace(&self) -> Option<&Bus> {
        self.params.trace.as_ref()
    }

    /// Admits queued envelopes up to the ceiling and spawns their drivers.
    fn pump(self: &Arc<Self>) {
        let admitted: Vec<TaskEnvelope<T>> = {
            let mut state = self.lock();
            let mut admitted = Vec::new();
            while let Some(envelope) = state.gate.admit_next() {
                if let Some(bus) = self.trace() {
                    bus.publish(
                        TraceEvent::new(TraceKind::Admit)
                            .with_index(envelope.index())
                            .with_gauges(state.gate.running(), state.gate.queued()),
                    );
                }
                admitted.push(envelope);
            }
            admitted
        };

        for envelope in admitted {
            tokio::spawn(Arc::clone(self).drive(envelope));
        }
    }

    async fn drive(self: Arc<Self>, mut envelope: TaskEnvelope<T>) {
        let outcome = runner::execute(&mut envelope, &self.params, &self.runtime_token).await;
        self.settle(envelope, outcome);
        self.pump();
    }

    fn settle(&self, mut envelope: TaskEnvelope<T>, outcome: Result<T, TaskError>) {
        let index = envelope.index();
        let attempts = envelope.attempt();
        let slot = ResultSlot::from(outcome);
        debug_assert_eq!(envelope.state(), EnvelopeState::Running);
        envelope.advance(EnvelopeState::from(slot.status()));

        let mut guard = self.lock();
        let state = &mut *guard;
        if !state.table.settle(index, slot.clone()) {
            tracing::warn!(index, "result slot already settled; outcome discarded");
        }
        state.gate.release();

        match envelope.into_origin() {
            Origin::Run(run) => {
                let complete = state
                    .runs
                    .get_mut(&run)
                    .is_some_and(|tracker| tracker.record_settled(&state.table));
                if complete {
                    state.runs.remove(&run);
                }
            }
            Origin::Add(reply) => {
                // The caller may have dropped the handle; the table still has the slot.
                let _ = reply.send(IndexedSlot {
                    index,
                    slot: slot.clone(),
                });
            }
        }

        if let Some(bus) = self.trace() {
            let mut ev = TraceEvent::new(TraceKind::Settle)
                .with_index(index)
                .with_attempt(attempts)
                .with_status(slot.status())
                .with_gauges(state.gate.running(), state.gate.queued());
            if let ResultSlot::Rejected(err) = &slot {
                ev = ev.with_reason(err.to_string());
            }
            bus.publish(ev);
        }
    }
}
