//! Streaming relay subsystem.
//!
//! # Data Flow
//! ```text
//! upstream byte stream
//!     → decoder.rs (frame boundaries, `data:` payload extraction)
//!     → session.rs (per-task relay state machine)
//!         → webhook.rs (best-effort outward delivery)
//!         → tasks::correlator (completion-signal capture)
//!         → downstream sink (subscriber, order-preserving)
//! ```
//!
//! # Design Decisions
//! - One lightweight task per relay session; suspension only at I/O
//! - Registry entry lifetime is guard-scoped: removed on every exit path
//! - Per-event failures never abort the session

pub mod decoder;
pub mod registry;
pub mod session;
pub mod webhook;

pub use decoder::FrameDecoder;
pub use registry::{Connection, ConnectionRegistry};
pub use session::{RelayService, SessionHandle};
pub use webhook::WebhookForwarder;
