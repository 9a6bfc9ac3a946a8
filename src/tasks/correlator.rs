//! Task completion records and the bounded waiting protocol.
//!
//! # Responsibilities
//! - Hold at most one completion record per task id
//! - Exactly-once consumption: reading a record removes it
//! - Suspend the synchronous caller until completion or deadline, without
//!   blocking a worker thread
//!
//! # Design Decisions
//! - Waiters are woken on arrival via a per-task Notify; a fixed-interval
//!   re-check remains as a fallback, preserving the polling contract
//! - A completion recorded after the waiter gave up is discarded, so a
//!   timed-out task id never leaves an orphaned record behind
//! - The abandoned-id set is pruned by TTL so it cannot grow unbounded

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Completion status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Completed,
}

/// A completion record for one task id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub task_id: String,
    pub status: TaskStatus,
    /// Opaque payload from the backend.
    pub result: Value,
    pub timestamp: DateTime<Utc>,
}

impl TaskResult {
    pub fn completed(task_id: String, result: Value) -> Self {
        Self {
            task_id,
            status: TaskStatus::Completed,
            result,
            timestamp: Utc::now(),
        }
    }
}

/// Correlates asynchronous completion signals with waiting submitters.
#[derive(Debug)]
pub struct TaskCorrelator {
    results: DashMap<String, TaskResult>,
    waiters: DashMap<String, Arc<Notify>>,
    abandoned: DashMap<String, Instant>,
    abandoned_ttl: Duration,
}

impl TaskCorrelator {
    /// `abandoned_ttl` bounds how long a timed-out task id keeps discarding
    /// late completions.
    pub fn new(abandoned_ttl: Duration) -> Self {
        Self {
            results: DashMap::new(),
            waiters: DashMap::new(),
            abandoned: DashMap::new(),
            abandoned_ttl,
        }
    }

    /// Store a completion record, overwriting any unconsumed prior record
    /// for the same id (last completion wins), and wake its waiter.
    ///
    /// A record for an id whose waiter already timed out is discarded.
    pub fn record(&self, result: TaskResult) {
        let task_id = result.task_id.clone();
        if self.abandoned.remove(&task_id).is_some() {
            tracing::debug!(task_id = %task_id, "discarding completion for timed-out task");
            return;
        }

        tracing::debug!(task_id = %task_id, "completion recorded");
        self.results.insert(task_id.clone(), result);
        if let Some(notify) = self.waiters.get(&task_id) {
            notify.notify_one();
        }
    }

    /// Remove and return the record for `task_id`, if any. Exactly-once:
    /// every later call for the same record returns `None`.
    pub fn try_consume(&self, task_id: &str) -> Option<TaskResult> {
        self.results.remove(task_id).map(|(_, result)| result)
    }

    /// Number of unconsumed completion records.
    pub fn pending_count(&self) -> usize {
        self.results.len()
    }

    /// Wait until a completion for `task_id` can be consumed, up to
    /// `deadline`. Wakes on arrival; `poll_interval` bounds the fallback
    /// re-check. Returns `None` on deadline, after which any late record
    /// for this id is discarded rather than orphaned.
    pub async fn await_result(
        &self,
        task_id: &str,
        deadline: Duration,
        poll_interval: Duration,
    ) -> Option<TaskResult> {
        let notify = self
            .waiters
            .entry(task_id.to_string())
            .or_insert_with(|| Arc::new(Notify::new()))
            .clone();
        let deadline_at = Instant::now() + deadline;

        let result = loop {
            if let Some(result) = self.try_consume(task_id) {
                break Some(result);
            }
            let now = Instant::now();
            if now >= deadline_at {
                break None;
            }
            let step = poll_interval.min(deadline_at - now);
            tokio::select! {
                _ = notify.notified() => {}
                _ = tokio::time::sleep(step) => {}
            }
        };

        self.waiters.remove(task_id);
        if result.is_none() {
            self.abandon(task_id);
        }
        result
    }

    /// Timeout path: consume-and-discard anything already recorded, then
    /// flag the id so a late `record` is dropped too.
    fn abandon(&self, task_id: &str) {
        self.results.remove(task_id);
        self.prune_abandoned();
        self.abandoned.insert(task_id.to_string(), Instant::now());
    }

    fn prune_abandoned(&self) {
        let ttl = self.abandoned_ttl;
        self.abandoned.retain(|_, flagged_at| flagged_at.elapsed() < ttl);
    }
}
