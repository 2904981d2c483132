use std::sync::Arc;

use tokio::{select, sync::broadcast::error::RecvError};
use tokio_util::sync::CancellationToken;

use super::scheduler::Scheduler;
use crate::{
    config::SchedulerConfig,
    error::ConfigError,
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Scheduler`] with optional subscribers.
pub struct SchedulerBuilder<T> {
    cfg: SchedulerConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: Clone + Send + 'static> SchedulerBuilder<T> {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SchedulerConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            _marker: std::marker::PhantomData,
        }
    }

    /// Sets trace subscribers.
    ///
    /// Subscribers receive [`TraceEvent`](crate::TraceEvent)s through dedicated
    /// workers with bounded queues. Trace events are only produced when
    /// [`SchedulerConfig::debug`] is set.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Validates the configuration and builds the scheduler.
    ///
    /// With a non-empty subscriber list this spawns the subscriber workers, so
    /// it must then be called from within a Tokio runtime.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the concurrency range is invalid.
    pub fn build(self) -> Result<Scheduler<T>, ConfigError> {
        self.cfg.validate()?;

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let runtime_token = CancellationToken::new();

        if !self.subscribers.is_empty() {
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            subscriber_listener(&bus, set, runtime_token.clone());
        }

        Ok(Scheduler::from_parts(self.cfg, bus, runtime_token))
    }
}

/// Forwards bus events to the subscriber set until the scheduler is dropped.
fn subscriber_listener(bus: &Bus, set: SubscriberSet, token: CancellationToken) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            select! {
                _ = token.cancelled() => break,
                res = rx.recv() => match res {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber listener lagged behind the trace bus");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
        while let Ok(ev) = rx.try_recv() {
            set.emit(&ev);
        }
        set.shutdown().await;
    });
}
