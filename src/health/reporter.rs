//! Health snapshot of the relay and correlation state.

use std::sync::Arc;

use serde::Serialize;

use crate::relay::registry::ConnectionRegistry;
use crate::tasks::correlator::TaskCorrelator;

/// Point-in-time gateway health.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub status: &'static str,
    pub connections: usize,
    #[serde(rename = "pendingTasks")]
    pub pending_tasks: usize,
}

/// Pure read over the registry and correlator; no side effects.
#[derive(Clone)]
pub struct HealthReporter {
    registry: Arc<ConnectionRegistry>,
    correlator: Arc<TaskCorrelator>,
}

impl HealthReporter {
    pub fn new(registry: Arc<ConnectionRegistry>, correlator: Arc<TaskCorrelator>) -> Self {
        Self {
            registry,
            correlator,
        }
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            status: "ok",
            connections: self.registry.count(),
            pending_tasks: self.correlator.pending_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn snapshot_reads_both_counts() {
        let registry = Arc::new(ConnectionRegistry::new());
        let correlator = Arc::new(TaskCorrelator::new(Duration::from_secs(60)));
        let reporter = HealthReporter::new(registry, correlator);

        let snapshot = reporter.snapshot();
        assert_eq!(snapshot.status, "ok");
        assert_eq!(snapshot.connections, 0);
        assert_eq!(snapshot.pending_tasks, 0);

        let value = serde_json::to_value(&snapshot).expect("serialize");
        assert_eq!(value["pendingTasks"], 0);
    }
}
