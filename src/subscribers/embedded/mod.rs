//! # Built-in subscribers
//!
//! - [`LogWriter`]: forwards trace events to `tracing` (demo/debug).

mod log;

pub use log::LogWriter;
