//! Observability subsystem.
//!
//! # Responsibilities
//! - Initialize the structured logging subsystem
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - Log level configurable via config, overridable with RUST_LOG

pub mod logging;
