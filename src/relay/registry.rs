//! Live relay session tracking.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;

/// One live relay session.
#[derive(Debug)]
pub struct Connection {
    /// The task this session relays events for.
    pub task_id: String,
    /// Downstream destination for relayed event payloads.
    pub sink: mpsc::Sender<String>,
}

/// Process-wide table of live relay sessions, keyed by connection id.
///
/// Concurrent sessions use distinct ids, so per-key synchronization is
/// enough; callers never see the backing map.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    sessions: DashMap<String, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session and return a guard that removes it again when
    /// dropped. The guard is the only removal path, so an entry exists for
    /// exactly the lifetime between stream-open and stream-close/error.
    pub fn register(self: &Arc<Self>, id: String, connection: Connection) -> ConnectionGuard {
        tracing::debug!(connection_id = %id, task_id = %connection.task_id, "connection registered");
        self.sessions.insert(id.clone(), connection);
        ConnectionGuard {
            registry: self.clone(),
            id,
        }
    }

    fn remove(&self, id: &str) {
        if self.sessions.remove(id).is_some() {
            tracing::debug!(connection_id = %id, "connection removed");
        }
    }

    /// Number of live sessions.
    pub fn count(&self) -> usize {
        self.sessions.len()
    }
}

/// RAII guard for one registry entry.
///
/// Created only after the upstream stream is open, so cleanup never runs
/// for an id that was never registered.
#[derive(Debug)]
pub struct ConnectionGuard {
    registry: Arc<ConnectionRegistry>,
    id: String,
}

impl ConnectionGuard {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.registry.remove(&self.id);
    }
}
