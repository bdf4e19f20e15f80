//! Core types for plan orchestration

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use action_registry::ActionResult;

use crate::context::ContextRequirement;

/// Status machine of a scheduled action instance:
/// `pending -> in_progress -> {completed, failed}`; `failed` may transition
/// back to `in_progress` under retry, bounded by `max_retries`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// An action instance scheduled for execution within a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedAction {
    /// Identity within the plan.
    pub id: String,

    /// Catalogue name of the action to invoke.
    pub action: String,

    /// Raw parameters, validated against the action's schema at dispatch.
    #[serde(default = "default_params")]
    pub params: Value,

    /// Ids of actions that must have executed before this one runs.
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Total attempts allowed, including the first try.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Per-invocation deadline in milliseconds (0 = executor default).
    #[serde(default)]
    pub timeout_ms: u64,

    /// Preconditions evaluated against a context snapshot before dispatch.
    #[serde(default)]
    pub context_requirements: Vec<ContextRequirement>,

    /// Ids of in-plan actions to try when this one fails terminally.
    #[serde(default)]
    pub fallback_actions: Vec<String>,

    /// Current status.
    #[serde(default)]
    pub status: ActionStatus,
}

fn default_params() -> Value {
    Value::Object(Default::default())
}

fn default_max_retries() -> u32 {
    3
}

impl EnhancedAction {
    pub fn new(id: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            action: action.into(),
            params: default_params(),
            dependencies: Vec::new(),
            max_retries: default_max_retries(),
            timeout_ms: 0,
            context_requirements: Vec::new(),
            fallback_actions: Vec::new(),
            status: ActionStatus::Pending,
        }
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    pub fn with_dependency(mut self, id: impl Into<String>) -> Self {
        self.dependencies.push(id.into());
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_requirement(mut self, requirement: ContextRequirement) -> Self {
        self.context_requirements.push(requirement);
        self
    }

    pub fn with_fallback(mut self, id: impl Into<String>) -> Self {
        self.fallback_actions.push(id.into());
        self
    }
}

/// How a plan schedules its actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Sequential,
    Parallel,

    /// Concurrency width derived from the plan's declared risk level.
    Adaptive,
}

/// What an unrecovered failure does to the rest of the plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorHandling {
    #[default]
    StopOnError,
    ContinueOnError,
}

/// Plan-level execution strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExecutionStrategy {
    #[serde(default)]
    pub mode: ExecutionMode,

    /// Upper bound on concurrently outstanding actions; enforced, not merely
    /// recorded.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    #[serde(default)]
    pub error_handling: ErrorHandling,
}

fn default_max_concurrency() -> usize {
    4
}

impl Default for ExecutionStrategy {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Sequential,
            max_concurrency: default_max_concurrency(),
            error_handling: ErrorHandling::StopOnError,
        }
    }
}

/// Declared risk of running a plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

/// An ordered, dependency-annotated collection of scheduled actions.
///
/// Invariant: the action-level dependency graph must be acyclic; a cycle is
/// a fatal configuration error detected at ordering time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub id: String,

    pub actions: Vec<EnhancedAction>,

    /// Plan-level prerequisites, recorded for the planner's bookkeeping.
    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default)]
    pub estimated_duration_ms: u64,

    #[serde(default)]
    pub risk_level: RiskLevel,

    #[serde(default)]
    pub strategy: ExecutionStrategy,
}

impl ExecutionPlan {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            actions: Vec::new(),
            dependencies: Vec::new(),
            estimated_duration_ms: 0,
            risk_level: RiskLevel::default(),
            strategy: ExecutionStrategy::default(),
        }
    }

    pub fn with_action(mut self, action: EnhancedAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_risk(mut self, risk: RiskLevel) -> Self {
        self.risk_level = risk;
        self
    }
}

/// Batch execution mode for `execute_actions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    /// One at a time; stops at the first failure.
    Sequential,

    /// All launched concurrently, all awaited; results in submission order.
    Parallel,
}

/// One recorded result within a plan report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanActionResult {
    pub action_id: String,

    /// Set when this result came from a fallback dispatched to recover the
    /// named action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_for: Option<String>,

    pub result: ActionResult,
}

/// Aggregate outcome of a plan run.
///
/// A partially-completed plan is always inspectable: failures aggregate here
/// rather than being thrown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanReport {
    pub plan_id: String,

    /// True when every dispatched action either succeeded or had its failure
    /// recovered, and the plan was not halted.
    pub success: bool,

    /// True when execution stopped early (stop-on-error or cancellation).
    pub halted: bool,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub finished_at: DateTime<Utc>,

    pub latency_ms: u64,

    /// Results in execution order, fallback results included.
    pub results: Vec<PlanActionResult>,

    /// Ids that ran to a terminal state, in execution order.
    pub executed: Vec<String>,

    /// Ids skipped because a predecessor never executed.
    pub skipped: Vec<String>,

    /// Ids whose terminal failure was recovered.
    pub recovered: Vec<String>,

    /// Final status of every scheduled action.
    pub statuses: BTreeMap<String, ActionStatus>,
}

/// Aggregate statistics over the execution history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExecutorStats {
    /// Actions currently in flight.
    pub active: usize,

    /// Total recorded invocations.
    pub total: usize,

    pub completed: usize,

    pub failed: usize,

    /// `completed / total`, 0.0 on empty history.
    pub success_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_builder_defaults() {
        let action = EnhancedAction::new("a1", "navigate_to")
            .with_params(json!({"url": "https://example.com"}))
            .with_dependency("a0")
            .with_fallback("a2");
        assert_eq!(action.status, ActionStatus::Pending);
        assert_eq!(action.max_retries, 3);
        assert_eq!(action.timeout_ms, 0);
        assert_eq!(action.dependencies, vec!["a0"]);
        assert_eq!(action.fallback_actions, vec!["a2"]);
    }

    #[test]
    fn plan_deserializes_with_defaults() {
        let plan: ExecutionPlan = serde_json::from_value(json!({
            "id": "p1",
            "actions": [
                {"id": "a1", "action": "navigate_to", "params": {"url": "https://example.com"}},
                {"id": "a2", "action": "extract_content", "dependencies": ["a1"]}
            ]
        }))
        .unwrap();
        assert_eq!(plan.actions.len(), 2);
        assert_eq!(plan.strategy.mode, ExecutionMode::Sequential);
        assert_eq!(plan.strategy.max_concurrency, 4);
        assert_eq!(plan.risk_level, RiskLevel::Medium);
        assert_eq!(plan.actions[1].dependencies, vec!["a1"]);
        assert!(plan.actions[1].params.is_object());
    }
}
