//! # Example: trace_subscriber
//!
//! Shows how to observe a scheduler in debug mode with a custom
//! [`Subscribe`] implementation that counts trace events.
//!
//! With the `logging` feature the built-in [`LogWriter`] is attached as well;
//! it emits through `tracing`, so install a `tracing` subscriber in your
//! application to see its records.
//!
//! ## Flow
//! ```text
//! run([ok, flaky, slow])  (debug = true)
//!   ├─► Admit          ×3
//!   ├─► RetryScheduled (flaky, attempt 1)
//!   ├─► TimeoutHit     (slow, every attempt)
//!   └─► Settle         ×3
//! Bus ──► subscriber listener ──► SubscriberSet ──► TraceCounter
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example trace_subscriber
//! cargo run --example trace_subscriber --features logging
//! ```

use std::{
    sync::Arc,
    sync::atomic::{AtomicU32, AtomicU64, Ordering},
    time::Duration,
};
use taskgate::{
    BackoffPolicy, Scheduler, SchedulerConfig, Subscribe, TaskError, TaskFn, TaskRef, TraceEvent,
    TraceKind,
};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct TraceCounter {
    admits: AtomicU64,
    retries: AtomicU64,
    timeouts: AtomicU64,
    settles: AtomicU64,
}

impl TraceCounter {
    fn print_stats(&self) {
        println!();
        println!("Trace events:");
        println!(" ├─► Admit:          {}", self.admits.load(Ordering::Relaxed));
        println!(" ├─► RetryScheduled: {}", self.retries.load(Ordering::Relaxed));
        println!(" ├─► TimeoutHit:     {}", self.timeouts.load(Ordering::Relaxed));
        println!(" └─► Settle:         {}", self.settles.load(Ordering::Relaxed));
    }
}

#[async_trait::async_trait]
impl Subscribe for TraceCounter {
    async fn on_event(&self, ev: &TraceEvent) {
        let counter = match ev.kind {
            TraceKind::Admit => &self.admits,
            TraceKind::RetryScheduled => &self.retries,
            TraceKind::TimeoutHit => &self.timeouts,
            TraceKind::Settle => &self.settles,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        println!("#{:<3} {:<16} index={:?}", ev.seq, ev.kind.as_label(), ev.index);
    }

    fn name(&self) -> &'static str {
        "trace-counter"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Debug mode publishes trace events; one retry, 200ms per attempt
    let cfg = SchedulerConfig::default()
        .with_debug(true)
        .with_timeout(Duration::from_millis(200))
        .with_retry_limit(1)
        .with_backoff(BackoffPolicy::immediate());

    // 2. Subscribers: our counter, plus LogWriter when the feature is on
    let counter = Arc::new(TraceCounter::default());
    #[allow(unused_mut)]
    let mut subs: Vec<Arc<dyn Subscribe>> = vec![Arc::clone(&counter) as Arc<dyn Subscribe>];
    #[cfg(feature = "logging")]
    subs.push(Arc::new(taskgate::LogWriter::new()));

    // 3. Create scheduler (must be inside the runtime when subscribers are attached)
    let scheduler: Scheduler<u32> = Scheduler::builder(cfg).with_subscribers(subs).build()?;

    // 4. One clean task, one that fails once, one that always times out
    let calls = Arc::new(AtomicU32::new(0));
    let flaky: TaskRef<u32> = TaskFn::arc(move |_ctx: CancellationToken| {
        let calls = Arc::clone(&calls);
        async move {
            if calls.fetch_add(1, Ordering::Relaxed) == 0 {
                return Err(TaskError::fail("first call fails"));
            }
            Ok(2)
        }
    });
    let slow: TaskRef<u32> = TaskFn::arc(|_ctx: CancellationToken| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(3)
    });
    let ok: TaskRef<u32> = TaskFn::arc(|_ctx: CancellationToken| async { Ok(1) });

    let results = scheduler.run(vec![ok, flaky, slow]).await;
    println!("results: {results:?}");

    // 5. Dropping the scheduler stops the listener; give workers a moment to drain
    drop(scheduler);
    tokio::time::sleep(Duration::from_millis(50)).await;
    counter.print_stats();
    Ok(())
}
