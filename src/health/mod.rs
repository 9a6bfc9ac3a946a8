//! Gateway health reporting.

pub mod reporter;

pub use reporter::{HealthReporter, HealthSnapshot};
