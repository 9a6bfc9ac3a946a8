//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! POST /api/perform
//!     → server.rs (validate, generate task id)
//!     → relay session (in-process, no loopback hop)
//!     → backend dispatch
//!     → bounded wait on the task correlator
//!     → TaskResult JSON | 408 | 500
//!
//! GET /sse?taskId=…
//!     → relay session → text/event-stream response
//! ```

pub mod server;

pub use server::HttpServer;
