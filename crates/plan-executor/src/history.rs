//! Execution history and statistics.
//!
//! The only mutable state the orchestrator owns: an append-only record of
//! every invocation plus an in-flight counter. Cleared explicitly by the
//! caller; not time-bounded.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use action_registry::ActionResult;
use pagepilot_core_types::AgentId;

use crate::types::ExecutorStats;

/// One recorded invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub action_id: String,
    pub result: ActionResult,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub executed_at: DateTime<Utc>,

    pub agent_id: AgentId,
}

/// Append-only invocation record keyed by action id.
#[derive(Default)]
pub struct ExecutionHistory {
    entries: RwLock<Vec<HistoryEntry>>,
    active: AtomicUsize,
}

/// RAII marker for an in-flight invocation.
pub struct ActiveGuard<'a> {
    counter: &'a AtomicUsize,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ExecutionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an invocation as in flight for the guard's lifetime.
    pub fn begin(&self) -> ActiveGuard<'_> {
        self.active.fetch_add(1, Ordering::SeqCst);
        ActiveGuard {
            counter: &self.active,
        }
    }

    pub fn record(&self, entry: HistoryEntry) {
        self.entries.write().push(entry);
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Every recorded invocation of one action id, in execution order.
    pub fn entries_for(&self, action_id: &str) -> Vec<HistoryEntry> {
        self.entries
            .read()
            .iter()
            .filter(|entry| entry.action_id == action_id)
            .cloned()
            .collect()
    }

    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.entries.read().clone()
    }

    /// Aggregate statistics; success rate is 0.0 on empty history, never NaN.
    pub fn stats(&self) -> ExecutorStats {
        let entries = self.entries.read();
        let total = entries.len();
        let completed = entries.iter().filter(|entry| entry.result.success).count();
        let failed = total - completed;
        let success_rate = if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64
        };
        ExecutorStats {
            active: self.active.load(Ordering::SeqCst),
            total,
            completed,
            failed,
            success_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_registry::ErrorKind;

    fn entry(action_id: &str, success: bool) -> HistoryEntry {
        let result = if success {
            ActionResult::ok_empty()
        } else {
            ActionResult::failed(ErrorKind::TargetFailure, "boom")
        };
        HistoryEntry {
            action_id: action_id.to_string(),
            result,
            executed_at: Utc::now(),
            agent_id: AgentId::named("test-agent"),
        }
    }

    #[test]
    fn empty_history_has_zero_success_rate() {
        let history = ExecutionHistory::new();
        let stats = history.stats();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert!(!stats.success_rate.is_nan());
    }

    #[test]
    fn success_rate_is_completed_over_total() {
        let history = ExecutionHistory::new();
        for _ in 0..3 {
            history.record(entry("a", true));
        }
        history.record(entry("b", false));
        let stats = history.stats();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 3);
        assert_eq!(stats.failed, 1);
        assert!((stats.success_rate - 0.75).abs() < 1e-9);
    }

    #[test]
    fn active_guard_tracks_in_flight_count() {
        let history = ExecutionHistory::new();
        assert_eq!(history.stats().active, 0);
        {
            let _one = history.begin();
            let _two = history.begin();
            assert_eq!(history.stats().active, 2);
        }
        assert_eq!(history.stats().active, 0);
    }

    #[test]
    fn entries_for_filters_by_action_id() {
        let history = ExecutionHistory::new();
        history.record(entry("a", true));
        history.record(entry("b", true));
        history.record(entry("a", false));
        assert_eq!(history.entries_for("a").len(), 2);
        assert_eq!(history.entries_for("b").len(), 1);
        history.clear();
        assert!(history.is_empty());
    }
}
