//! # Example: retry_batch
//!
//! Runs a batch of flaky tasks through a [`Scheduler`] with a concurrency
//! ceiling of 2, an attempt deadline, and exponential backoff between retries.
//!
//! Results come back in submission order even though the tasks finish in a
//! different order, and a failing task only affects its own slot.
//!
//! ## Flow
//! ```text
//! run([fetch-0, fetch-1, fetch-2, hang, fatal])
//!   ├─► admit fetch-0, fetch-1        (running = 2, queued = 3)
//!   ├─► fetch-0 Err("flaky") → sleep(backoff) → attempt 2 → Ok
//!   ├─► fetch-1 Ok → admit fetch-2
//!   ├─► hang    exceeds 300ms on every attempt → Rejected(Timeout)
//!   ├─► fatal   Err(Fatal) → no retry        → Rejected(Fatal)
//!   └─► resolve [Fulfilled, Fulfilled, Fulfilled, Rejected, Rejected]
//! add(fetch-late)
//!   └─► next free index, resolves on its own
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example retry_batch
//! ```

use std::{
    sync::Arc,
    sync::atomic::{AtomicU32, Ordering},
    time::Duration,
};
use taskgate::{
    BackoffPolicy, JitterPolicy, ResultSlot, Scheduler, SchedulerConfig, TaskError, TaskFn, TaskRef,
};
use tokio_util::sync::CancellationToken;

fn fetch(id: u32, fail_first: u32) -> TaskRef<String> {
    let attempts = Arc::new(AtomicU32::new(0));
    TaskFn::arc(move |ctx: CancellationToken| {
        let attempts = Arc::clone(&attempts);
        async move {
            let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
            println!("[fetch-{id}] attempt {attempt}");

            tokio::select! {
                _ = ctx.cancelled() => return Err(TaskError::Canceled),
                _ = tokio::time::sleep(Duration::from_millis(50 * u64::from(3 - id % 3))) => {}
            }
            if attempt <= fail_first {
                return Err(TaskError::fail(format!("flaky on attempt {attempt}")));
            }
            Ok(format!("payload-{id}"))
        }
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Configure: 2 concurrent tasks, 300ms per attempt, up to 2 retries
    let backoff = BackoffPolicy {
        first: Duration::from_millis(50),
        max: Duration::from_millis(400),
        factor: 2.0,
        jitter: JitterPolicy::Equal,
    };
    let cfg = SchedulerConfig::default()
        .with_max_concurrency(2)
        .with_timeout(Duration::from_millis(300))
        .with_retry_limit(2)
        .with_backoff(backoff);

    // 2. Create scheduler
    let scheduler: Scheduler<String> = Scheduler::new(cfg)?;

    // 3. Build the batch: two flaky fetches, one clean, one hanging, one fatal
    let hang: TaskRef<String> = TaskFn::arc(|ctx: CancellationToken| async move {
        ctx.cancelled().await;
        Err(TaskError::Canceled)
    });
    let fatal: TaskRef<String> =
        TaskFn::arc(|_ctx: CancellationToken| async { Err(TaskError::fatal("bad credentials")) });
    let tasks = vec![fetch(0, 1), fetch(1, 0), fetch(2, 2), hang, fatal];

    // 4. Run the batch and print each slot at its submission index
    let results = scheduler.run(tasks).await;
    for (index, slot) in results.iter().enumerate() {
        match slot {
            ResultSlot::Fulfilled(value) => println!("[{index}] fulfilled: {value}"),
            ResultSlot::Rejected(err) => println!("[{index}] rejected:  {err}"),
            ResultSlot::Pending => println!("[{index}] pending"),
        }
    }

    // 5. Late addition gets the next free index
    let late = scheduler.add(fetch(3, 0)).await;
    println!("[{}] late add: {:?}", late.index, late.slot.value());

    let stats = scheduler.stats();
    println!();
    println!("Stats:");
    println!(" ├─► Submitted:    {}", stats.submitted);
    println!(" ├─► Fulfilled:    {}", stats.fulfilled);
    println!(" ├─► Rejected:     {}", stats.rejected);
    println!(" └─► Peak running: {}", stats.peak_running);
    Ok(())
}
