//! # Broadcast bus for trace events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`] and stamps each published event with
//! a sequence number from a counter owned by the bus itself. Every scheduler
//! creates its own bus; two schedulers never share a counter or a channel.
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never waits.
//! - **Bounded capacity**: one ring buffer shared by all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` events.
//! - **No persistence**: events published with no receiver attached are dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

use super::event::TraceEvent;

/// Broadcast channel for trace events.
///
/// Cheap to clone; clones share the channel and the sequence counter.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<TraceEvent>,
    seq: Arc<AtomicU64>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<TraceEvent>(capacity.max(1));
        Self {
            tx,
            seq: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Stamps `ev` with the next sequence number and publishes it.
    ///
    /// Returns the assigned sequence number. If nobody is listening the event is dropped.
    pub fn publish(&self, mut ev: TraceEvent) -> u64 {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        ev.seq = seq;
        let _ = self.tx.send(ev);
        seq
    }

    /// Creates a receiver that observes events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<TraceEvent> {
        self.tx.subscribe()
    }

    /// Number of receivers currently attached.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::TraceKind;

    #[tokio::test]
    async fn test_sequence_is_monotonic_per_bus() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();

        bus.publish(TraceEvent::new(TraceKind::Admit));
        bus.publish(TraceEvent::new(TraceKind::Settle));

        let a = rx.recv().await.unwrap();
        let b = rx.recv().await.unwrap();
        assert!(a.seq < b.seq);
        assert_eq!(a.kind, TraceKind::Admit);
    }

    #[test]
    fn test_buses_do_not_share_counters() {
        let first = Bus::new(1);
        let second = Bus::new(1);
        first.publish(TraceEvent::new(TraceKind::Admit));
        first.publish(TraceEvent::new(TraceKind::Admit));
        assert_eq!(second.publish(TraceEvent::new(TraceKind::Admit)), 1);
    }

    #[test]
    fn test_publish_without_receivers_is_fine() {
        let bus = Bus::new(0);
        assert_eq!(bus.receiver_count(), 0);
        bus.publish(TraceEvent::new(TraceKind::Settle));
    }
}
