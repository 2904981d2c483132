use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use taskgate::{
    BackoffPolicy, ConfigError, ResultSlot, Scheduler, SchedulerConfig, SlotStatus, Subscribe,
    TaskError, TaskFn, TaskRef, TraceEvent, TraceKind,
};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

fn delayed(ms: u64, value: &'static str) -> TaskRef<&'static str> {
    TaskFn::arc(move |_ctx: CancellationToken| async move {
        time::sleep(Duration::from_millis(ms)).await;
        Ok(value)
    })
}

fn failing(msg: &'static str) -> TaskRef<&'static str> {
    TaskFn::arc(move |_ctx: CancellationToken| async move { Err(TaskError::fail(msg)) })
}

fn scheduler<T: Clone + Send + 'static>(cfg: SchedulerConfig) -> Scheduler<T> {
    match Scheduler::new(cfg) {
        Ok(s) => s,
        Err(e) => panic!("invalid config: {e}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_results_follow_submission_order() {
    let finished = Arc::new(Mutex::new(Vec::new()));
    let tracked = |ms: u64, value: &'static str| -> TaskRef<&'static str> {
        let finished = Arc::clone(&finished);
        TaskFn::arc(move |_ctx: CancellationToken| {
            let finished = Arc::clone(&finished);
            async move {
                time::sleep(Duration::from_millis(ms)).await;
                finished.lock().unwrap().push(value);
                Ok(value)
            }
        })
    };

    let s = scheduler(SchedulerConfig::default().with_max_concurrency(2));
    let results = s
        .run(vec![tracked(200, "A"), tracked(10, "B"), tracked(50, "C")])
        .await;

    assert_eq!(
        results,
        vec![
            ResultSlot::Fulfilled("A"),
            ResultSlot::Fulfilled("B"),
            ResultSlot::Fulfilled("C"),
        ]
    );
    assert_eq!(*finished.lock().unwrap(), vec!["B", "C", "A"]);
}

#[tokio::test(start_paused = true)]
async fn test_failure_is_contained_in_its_slot() {
    let s = scheduler(SchedulerConfig::default());
    let results = s.run(vec![failing("x"), delayed(5, "y")]).await;

    assert_eq!(results[0], ResultSlot::Rejected(TaskError::fail("x")));
    assert_eq!(results[1], ResultSlot::Fulfilled("y"));
}

#[tokio::test(start_paused = true)]
async fn test_hung_task_times_out() {
    let s: Scheduler<()> = scheduler(SchedulerConfig::default().with_timeout(Duration::from_millis(500)));
    let hung: TaskRef<()> = TaskFn::arc(|_ctx: CancellationToken| std::future::pending::<Result<(), TaskError>>());

    let started = Instant::now();
    let results = s.run(vec![hung]).await;

    assert!(started.elapsed() >= Duration::from_millis(500));
    assert_eq!(
        results,
        vec![ResultSlot::Rejected(TaskError::Timeout {
            timeout: Duration::from_millis(500)
        })]
    );
}

#[tokio::test(start_paused = true)]
async fn test_running_count_stays_within_ceiling() {
    let s = scheduler(SchedulerConfig::default().with_max_concurrency(3));
    let in_flight = Arc::new(AtomicUsize::new(0));
    let observed_max = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<TaskRef<usize>> = (0..10)
        .map(|i| {
            let in_flight = Arc::clone(&in_flight);
            let observed_max = Arc::clone(&observed_max);
            TaskFn::arc(move |_ctx: CancellationToken| {
                let in_flight = Arc::clone(&in_flight);
                let observed_max = Arc::clone(&observed_max);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    observed_max.fetch_max(now, Ordering::SeqCst);
                    time::sleep(Duration::from_millis(10 + (i as u64 % 4) * 7)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(i)
                }
            })
        })
        .collect();

    let mut handle = s.run(tasks);
    let results = loop {
        tokio::select! {
            results = &mut handle => break results,
            _ = time::sleep(Duration::from_millis(3)) => {
                assert!(s.running() <= 3);
            }
        }
    };

    assert!(observed_max.load(Ordering::SeqCst) <= 3);
    assert_eq!(s.stats().peak_running, 3);
    let values: Vec<usize> = results.iter().filter_map(|r| r.value().copied()).collect();
    assert_eq!(values, (0..10).collect::<Vec<_>>());
    assert_eq!((s.running(), s.queued()), (0, 0));
}

#[tokio::test(start_paused = true)]
async fn test_add_on_idle_scheduler() {
    let s = scheduler(SchedulerConfig::default());

    let first = s.add(delayed(30, "t1"));
    let second = s.add(delayed(10, "t2"));
    assert_eq!((first.index(), second.index()), (0, 1));

    let second = second.await;
    assert_eq!((second.index, second.slot.clone()), (1, ResultSlot::Fulfilled("t2")));
    let first = first.await;
    assert_eq!((first.index, first.slot.clone()), (0, ResultSlot::Fulfilled("t1")));

    assert_eq!(
        s.ordered_results(),
        vec![ResultSlot::Fulfilled("t1"), ResultSlot::Fulfilled("t2")]
    );
}

#[tokio::test(start_paused = true)]
async fn test_add_during_run_takes_next_index() {
    let s = scheduler(SchedulerConfig::default().with_max_concurrency(1));

    let batch = s.run(vec![delayed(20, "a"), delayed(20, "b")]);
    let late = s.add(delayed(1, "late"));
    assert_eq!(batch.indices(), 0..2);
    assert_eq!(late.index(), 2);

    let results = batch.await;
    assert_eq!(results, vec![ResultSlot::Fulfilled("a"), ResultSlot::Fulfilled("b")]);

    let late = late.await;
    assert_eq!(late.slot, ResultSlot::Fulfilled("late"));
    assert_eq!(s.ordered_results().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_second_run_resolves_its_own_window() {
    let s = scheduler(SchedulerConfig::default());

    let first = s.run(vec![delayed(10, "one")]).await;
    let second = s.run(vec![delayed(10, "two"), delayed(5, "three")]).await;

    assert_eq!(first, vec![ResultSlot::Fulfilled("one")]);
    assert_eq!(second, vec![ResultSlot::Fulfilled("two"), ResultSlot::Fulfilled("three")]);
    assert_eq!(s.stats().submitted, 2);
}

#[tokio::test(start_paused = true)]
async fn test_run_on_idle_scheduler_starts_fresh_table() {
    let s = scheduler(SchedulerConfig::default());

    for (a, b) in [("a1", "b1"), ("a2", "b2"), ("a3", "b3")] {
        let handle = s.run(vec![delayed(20, a), delayed(10, b)]);
        assert_eq!(handle.indices(), 0..2);
        assert_eq!(handle.await, vec![ResultSlot::Fulfilled(a), ResultSlot::Fulfilled(b)]);
    }

    assert_eq!(
        s.ordered_results(),
        vec![ResultSlot::Fulfilled("a3"), ResultSlot::Fulfilled("b3")]
    );
    assert_eq!(s.stats().fulfilled, 2);
}

#[tokio::test(start_paused = true)]
async fn test_run_while_busy_appends_after_in_flight_work() {
    let s = scheduler(SchedulerConfig::default());

    let first = s.run(vec![delayed(50, "slow")]);
    let second = s.run(vec![delayed(10, "quick")]);
    assert_eq!((first.indices(), second.indices()), (0..1, 1..2));

    assert_eq!(second.await, vec![ResultSlot::Fulfilled("quick")]);
    assert_eq!(first.await, vec![ResultSlot::Fulfilled("slow")]);
    assert_eq!(
        s.ordered_results(),
        vec![ResultSlot::Fulfilled("slow"), ResultSlot::Fulfilled("quick")]
    );
}

#[tokio::test(start_paused = true)]
async fn test_finished_handle_survives_table_reset() {
    let s = scheduler(SchedulerConfig::default());

    let first = s.run(vec![delayed(10, "old")]);
    time::sleep(Duration::from_millis(20)).await;
    assert_eq!((s.running(), s.queued()), (0, 0));

    let second = s.run(vec![delayed(10, "new")]);
    assert_eq!(second.indices(), 0..1);

    assert_eq!(first.await, vec![ResultSlot::Fulfilled("old")]);
    assert_eq!(second.await, vec![ResultSlot::Fulfilled("new")]);
}

#[tokio::test]
async fn test_empty_batch_resolves_immediately() {
    let s: Scheduler<u8> = scheduler(SchedulerConfig::default());
    assert!(s.run(Vec::new()).await.is_empty());
    assert!(s.ordered_results().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_is_idempotent() {
    let s = scheduler(SchedulerConfig::default().with_max_concurrency(1));
    let handle = s.run(vec![delayed(10, "a"), delayed(1_000, "b")]);

    time::sleep(Duration::from_millis(50)).await;
    let first = s.ordered_results();
    let second = s.ordered_results();
    assert_eq!(first, second);
    assert_eq!(first, vec![ResultSlot::Fulfilled("a"), ResultSlot::Pending]);

    handle.await;
}

#[tokio::test(start_paused = true)]
async fn test_each_task_has_its_own_retry_budget() {
    let s = scheduler(
        SchedulerConfig::default()
            .with_retry_limit(2)
            .with_backoff(BackoffPolicy::immediate()),
    );

    let tasks: Vec<TaskRef<usize>> = (0..3)
        .map(|i| {
            let calls = Arc::new(AtomicUsize::new(0));
            TaskFn::arc(move |_ctx: CancellationToken| {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n <= 2 {
                        Err(TaskError::fail(format!("task {i} attempt {n}")))
                    } else {
                        Ok(i)
                    }
                }
            })
        })
        .collect();

    let results = s.run(tasks).await;
    assert!(results.iter().all(|r| r.status() == SlotStatus::Fulfilled));
}

#[tokio::test(start_paused = true)]
async fn test_panicking_task_is_isolated() {
    let s = scheduler(SchedulerConfig::default());
    let boom: TaskRef<&'static str> = TaskFn::arc(|_ctx: CancellationToken| async {
        if true {
            panic!("executor exploded");
        }
        Ok("never")
    });

    let results = s.run(vec![boom, delayed(5, "fine")]).await;
    assert_eq!(
        results[0],
        ResultSlot::Rejected(TaskError::Panicked {
            info: "executor exploded".into()
        })
    );
    assert_eq!(results[1], ResultSlot::Fulfilled("fine"));

    let stats = s.stats();
    assert_eq!((stats.fulfilled, stats.rejected, stats.pending()), (1, 1, 0));
}

#[tokio::test(start_paused = true)]
async fn test_dropped_handle_does_not_cancel_work() {
    let s = scheduler(SchedulerConfig::default());
    drop(s.run(vec![delayed(10, "kept")]));

    time::sleep(Duration::from_millis(20)).await;
    assert_eq!(s.ordered_results(), vec![ResultSlot::Fulfilled("kept")]);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_scheduler_aborts_retry_wait() {
    let s = scheduler(SchedulerConfig::default().with_retry_limit(5));
    let handle = s.run(vec![failing("down")]);
    time::sleep(Duration::from_millis(1)).await;

    let started = Instant::now();
    drop(s);
    let results = handle.await;

    assert_eq!(results, vec![ResultSlot::Rejected(TaskError::fail("down"))]);
    assert!(started.elapsed() < Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn test_debug_mode_traces_admit_and_settle() {
    let s = scheduler(
        SchedulerConfig::default()
            .with_max_concurrency(1)
            .with_debug(true),
    );
    let mut rx = s.subscribe();

    s.run(vec![delayed(5, "a"), failing("b")]).await;

    let mut events = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        events.push(ev);
    }
    let shape: Vec<(TraceKind, Option<usize>)> = events.iter().map(|e| (e.kind, e.index)).collect();
    assert_eq!(
        shape,
        vec![
            (TraceKind::Admit, Some(0)),
            (TraceKind::Settle, Some(0)),
            (TraceKind::Admit, Some(1)),
            (TraceKind::Settle, Some(1)),
        ]
    );

    assert_eq!((events[0].running, events[0].queued), (1, 1));
    assert_eq!(events[1].status, Some(SlotStatus::Fulfilled));
    assert_eq!(events[3].status, Some(SlotStatus::Rejected));
    assert_eq!(events[3].reason.as_deref(), Some("execution failed: b"));
    assert!(events.windows(2).all(|w| w[0].seq < w[1].seq));
}

#[tokio::test(start_paused = true)]
async fn test_quiet_without_debug() {
    let s = scheduler(SchedulerConfig::default());
    let mut rx = s.subscribe();
    s.run(vec![delayed(5, "a")]).await;
    assert!(rx.try_recv().is_err());
}

#[derive(Default)]
struct Recorder(Mutex<Vec<TraceKind>>);

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &TraceEvent) {
        self.0.lock().unwrap().push(event.kind);
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_receive_trace_events() {
    let recorder = Arc::new(Recorder::default());
    let built = Scheduler::builder(SchedulerConfig::default().with_debug(true))
        .with_subscribers(vec![recorder.clone() as Arc<dyn Subscribe>])
        .build();
    let s: Scheduler<&'static str> = match built {
        Ok(s) => s,
        Err(e) => panic!("invalid config: {e}"),
    };

    s.run(vec![delayed(5, "a"), delayed(5, "b")]).await;
    time::sleep(Duration::from_millis(10)).await;

    let seen = recorder.0.lock().unwrap().clone();
    assert_eq!(seen.iter().filter(|k| **k == TraceKind::Admit).count(), 2);
    assert_eq!(seen.iter().filter(|k| **k == TraceKind::Settle).count(), 2);
}

#[test]
fn test_invalid_config_is_rejected() {
    let cfg = SchedulerConfig::default().with_max_concurrency(0);
    assert!(matches!(
        Scheduler::<u8>::new(cfg),
        Err(ConfigError::ZeroMaxConcurrency)
    ));

    let cfg = SchedulerConfig::default().with_max_concurrency(2).with_min_concurrency(3);
    assert!(matches!(
        Scheduler::<u8>::new(cfg),
        Err(ConfigError::MinAboveMax { min: 3, max: 2 })
    ));

    let cfg = SchedulerConfig::default().with_min_concurrency(3).with_max_concurrency(2);
    assert!(matches!(
        Scheduler::<u8>::new(cfg),
        Err(ConfigError::MinAboveMax { min: 3, max: 2 })
    ));

    assert!(Scheduler::<u8>::new(SchedulerConfig::default().with_max_concurrency(1)).is_ok());
}
