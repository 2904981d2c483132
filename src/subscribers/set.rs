//! # SubscriberSet: non-blocking fan-out over multiple subscribers
//!
//! [`SubscriberSet`] distributes each [`TraceEvent`] to multiple subscribers
//! **without awaiting** their processing.
//!
//! ## What it guarantees
//! - `emit(&TraceEvent)` returns immediately.
//! - Per-subscriber FIFO (queue order).
//! - Panics inside subscribers are caught and reported as `SubscriberPanicked`.
//!
//! ## What it does **not** guarantee
//! - No global ordering across different subscribers.
//! - No retries on per-subscriber queue overflow.
//!
//! ## Diagram
//! ```text
//!    emit(&TraceEvent)
//!        │                        (Arc-clone per subscriber)
//!        ├────────────────► [queue S1] ─► worker S1 ─► on_event()
//!        ├────────────────► [queue S2] ─► worker S2 ─► on_event()
//!        └────────────────► [queue SN] ─► worker SN ─► on_event()
//! ```

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use super::Subscribe;
use crate::{
    error::panic_message,
    events::{Bus, TraceEvent},
};

struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<TraceEvent>>,
}

/// Composite fan-out with per-subscriber bounded queues and worker tasks.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker per subscriber.
    ///
    /// Each subscriber gets a bounded queue of `max(queue_capacity, 1)`.
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, rx) = mpsc::channel::<Arc<TraceEvent>>(sub.queue_capacity().max(1));
            workers.push(tokio::spawn(worker(sub, rx, bus.clone())));
            channels.push(SubscriberChannel { name, sender: tx });
        }

        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Fan-out one event to all subscribers (non-blocking).
    ///
    /// If a subscriber's queue is full or closed the event is dropped for it and
    /// a `SubscriberOverflow` event is published, unless the dropped event is
    /// itself a subscriber event.
    pub fn emit(&self, event: &TraceEvent) {
        let ev = Arc::new(event.clone());
        for channel in &self.channels {
            let reason = match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if ev.is_subscriber_event() {
                tracing::warn!(subscriber = channel.name, reason, "dropped subscriber event");
            } else {
                self.bus
                    .publish(TraceEvent::subscriber_overflow(channel.name, reason));
            }
        }
    }

    /// Graceful shutdown: close all queues and await worker completion.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}

async fn worker(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<TraceEvent>>, bus: Bus) {
    while let Some(ev) = rx.recv().await {
        let fut = sub.on_event(ev.as_ref());
        if let Err(payload) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
            let info = panic_message(&*payload);
            // A panic on a subscriber event is not republished, so a subscriber
            // that always panics can't feed itself.
            if ev.is_subscriber_event() {
                tracing::warn!(subscriber = sub.name(), %info, "subscriber panicked");
            } else {
                bus.publish(TraceEvent::subscriber_panicked(sub.name(), info));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::TraceKind;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct Collect(Mutex<Vec<Option<usize>>>);

    #[async_trait]
    impl Subscribe for Collect {
        async fn on_event(&self, event: &TraceEvent) {
            self.0.lock().unwrap().push(event.index);
        }
        fn name(&self) -> &'static str {
            "collect"
        }
    }

    struct Explode;

    #[async_trait]
    impl Subscribe for Explode {
        async fn on_event(&self, _event: &TraceEvent) {
            panic!("subscriber blew up");
        }
        fn name(&self) -> &'static str {
            "explode"
        }
    }

    struct Stuck(Arc<Notify>);

    #[async_trait]
    impl Subscribe for Stuck {
        async fn on_event(&self, _event: &TraceEvent) {
            self.0.notified().await;
        }
        fn name(&self) -> &'static str {
            "stuck"
        }
        fn queue_capacity(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn test_events_reach_subscriber_in_order() {
        let collect = Arc::new(Collect::default());
        let set = SubscriberSet::new(vec![collect.clone() as Arc<dyn Subscribe>], Bus::new(8));
        for i in 0..3 {
            set.emit(&TraceEvent::new(TraceKind::Admit).with_index(i));
        }
        set.shutdown().await;
        assert_eq!(*collect.0.lock().unwrap(), vec![Some(0), Some(1), Some(2)]);
    }

    #[tokio::test]
    async fn test_panic_is_reported_on_bus() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Explode) as Arc<dyn Subscribe>], bus.clone());

        set.emit(&TraceEvent::new(TraceKind::Settle).with_index(0));
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, TraceKind::SubscriberPanicked);
        assert_eq!(ev.subscriber, Some("explode"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber blew up"));
        set.shutdown().await;
    }

    #[tokio::test]
    async fn test_full_queue_publishes_overflow() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let gate = Arc::new(Notify::new());
        let set = SubscriberSet::new(vec![Arc::new(Stuck(gate.clone())) as Arc<dyn Subscribe>], bus.clone());

        set.emit(&TraceEvent::new(TraceKind::Admit).with_index(0));
        set.emit(&TraceEvent::new(TraceKind::Admit).with_index(1));

        let ev = rx.try_recv().unwrap();
        assert_eq!(ev.kind, TraceKind::SubscriberOverflow);
        assert_eq!((ev.subscriber, ev.reason.as_deref()), (Some("stuck"), Some("full")));
        assert_eq!(set.len(), 1);

        gate.notify_one();
        drop(set);
    }
}
