//! # Trace subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out,
//! and built-in implementations for handling [`TraceEvent`](crate::TraceEvent)s
//! published on the scheduler's [`Bus`](crate::Bus).
//!
//! ## Architecture
//! ```text
//! Scheduler (debug) ── publish(TraceEvent) ──► Bus ──► listener ──► SubscriberSet::emit
//!                                                                 ┌──────┴──────┐
//!                                                                 ▼             ▼
//!                                                             LogWriter      Custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```rust
//! use async_trait::async_trait;
//! use taskgate::{Subscribe, TraceEvent, TraceKind};
//!
//! struct RetryCounter(std::sync::atomic::AtomicUsize);
//!
//! #[async_trait]
//! impl Subscribe for RetryCounter {
//!     async fn on_event(&self, event: &TraceEvent) {
//!         if event.kind == TraceKind::RetryScheduled {
//!             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "retry-counter"
//!     }
//! }
//! ```

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod embedded;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
