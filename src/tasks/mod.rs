//! # Task abstractions.
//!
//! - [`Task`] - trait for re-invocable async operations producing a value
//! - [`TaskFn`] - closure-backed implementation
//! - [`TaskRef`] - shared handle (`Arc<dyn Task<T>>`) the scheduler accepts

mod task;
mod task_fn;

pub use task::{Task, TaskRef};
pub use task_fn::TaskFn;
