//! Trace events: types and broadcast bus.
//!
//! When [`SchedulerConfig::debug`](crate::SchedulerConfig::debug) is set, the
//! scheduler reports every admission and settlement as a [`TraceEvent`] on its
//! own [`Bus`]. Trace events never go through a global logger; callers capture events
//! through [`Scheduler::subscribe`](crate::Scheduler::subscribe) or by
//! registering [`Subscribe`](crate::Subscribe) sinks on the builder.
//!
//! ## Contents
//! - [`TraceKind`], [`TraceEvent`] event classification and payload
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`

mod bus;
mod event;

pub use bus::Bus;
pub use event::{TraceEvent, TraceKind};
