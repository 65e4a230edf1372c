//! Background execution.
//!
//! Hardware reconfiguration never runs on the UI thread. It is submitted to
//! a single serial [`WorkQueue`] and reports back through messages that the
//! UI thread drains.

mod queue;

pub use queue::{CancelToken, Priority, WorkQueue};
