//! Pending-task completion protocol.

pub mod correlator;

pub use correlator::{TaskCorrelator, TaskResult, TaskStatus};
