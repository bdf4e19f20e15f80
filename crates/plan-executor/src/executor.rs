//! Orchestrator implementation

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use action_registry::{ActionCtx, ActionRegistry, ActionResult, ErrorKind};
use element_resolver::ElementResolver;
use pagepilot_core_types::AgentId;
use pagepilot_event_bus::{EventBus, ExecutionEvent, InMemoryBus};
use target_adapter::TargetAdapter;

use crate::context::{evaluate_requirements, ContextSnapshot};
use crate::errors::ExecutorError;
use crate::history::{ExecutionHistory, HistoryEntry};
use crate::ordering::{execution_levels, execution_order};
use crate::retry::BackoffPolicy;
use crate::types::{
    ActionStatus, BatchMode, EnhancedAction, ErrorHandling, ExecutionMode, ExecutionPlan,
    ExecutorStats, PlanActionResult, PlanReport, RiskLevel,
};

const DEFAULT_ACTION_TIMEOUT_MS: u64 = 30_000;

/// The execution orchestrator.
///
/// Cheap to clone; every field is shared. All remote operations are
/// cooperative async tasks, so "parallel" execution means concurrently
/// outstanding tasks bounded by the plan's concurrency width, not OS-thread
/// parallelism.
#[derive(Clone)]
pub struct PlanExecutor {
    registry: Arc<ActionRegistry>,
    adapter: Arc<dyn TargetAdapter>,
    resolver: Arc<ElementResolver>,
    bus: Arc<InMemoryBus<ExecutionEvent>>,
    history: Arc<ExecutionHistory>,
    agent_id: AgentId,
    backoff: BackoffPolicy,
    default_timeout_ms: u64,
}

/// Mutable bookkeeping for one plan run.
#[derive(Default)]
struct PlanState {
    executed: HashSet<String>,
    executed_order: Vec<String>,
    skipped: Vec<String>,
    recovered: Vec<String>,
    results: Vec<PlanActionResult>,
    statuses: BTreeMap<String, ActionStatus>,
    unrecovered: usize,
    halted: bool,
}

impl PlanState {
    fn new(actions: &[EnhancedAction]) -> Self {
        Self {
            statuses: actions
                .iter()
                .map(|action| (action.id.clone(), ActionStatus::Pending))
                .collect(),
            ..Default::default()
        }
    }
}

impl PlanExecutor {
    pub fn new(
        registry: Arc<ActionRegistry>,
        adapter: Arc<dyn TargetAdapter>,
        resolver: Arc<ElementResolver>,
        bus: Arc<InMemoryBus<ExecutionEvent>>,
    ) -> Self {
        Self {
            registry,
            adapter,
            resolver,
            bus,
            history: Arc::new(ExecutionHistory::new()),
            agent_id: AgentId::named("executor"),
            backoff: BackoffPolicy::default(),
            default_timeout_ms: DEFAULT_ACTION_TIMEOUT_MS,
        }
    }

    pub fn with_agent_id(mut self, agent_id: AgentId) -> Self {
        self.agent_id = agent_id;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_default_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.default_timeout_ms = timeout_ms;
        self
    }

    pub fn history(&self) -> &ExecutionHistory {
        &self.history
    }

    pub fn stats(&self) -> ExecutorStats {
        self.history.stats()
    }

    pub fn clear_history(&self) {
        self.history.clear();
    }

    /// Execute one action: emit a start event, gate on context requirements,
    /// dispatch the catalogue handler bounded by its timeout, record history
    /// and emit the terminal event. Never returns an error: every failure
    /// becomes a typed result.
    pub async fn execute_action(&self, action: &EnhancedAction) -> ActionResult {
        self.publish(ExecutionEvent::started(
            self.agent_id.0.clone(),
            action.id.clone(),
            action.action.clone(),
        ))
        .await;

        let _active = self.history.begin();
        let started = Instant::now();

        let mut result = self.dispatch(action).await;
        result.timing_ms = started.elapsed().as_millis() as u64;
        result
            .metadata
            .insert("action_id".to_string(), json!(action.id));
        result
            .metadata
            .insert("agent_id".to_string(), json!(self.agent_id.0));
        result
            .metadata
            .insert("action".to_string(), json!(action.action));

        self.history.record(HistoryEntry {
            action_id: action.id.clone(),
            result: result.clone(),
            executed_at: Utc::now(),
            agent_id: self.agent_id.clone(),
        });

        if result.success {
            self.publish(ExecutionEvent::succeeded(
                self.agent_id.0.clone(),
                action.id.clone(),
                action.action.clone(),
                result.data.clone().unwrap_or(Value::Null),
            ))
            .await;
        } else {
            self.publish(ExecutionEvent::failed(
                self.agent_id.0.clone(),
                action.id.clone(),
                action.action.clone(),
                result.error.clone().unwrap_or_default(),
            ))
            .await;
        }
        result
    }

    async fn dispatch(&self, action: &EnhancedAction) -> ActionResult {
        let mut warnings = Vec::new();
        if !action.context_requirements.is_empty() {
            let snapshot = match ContextSnapshot::capture(self.adapter.as_ref()).await {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    return ActionResult::failed(
                        ErrorKind::ContextPrecondition,
                        format!("context snapshot unavailable: {err}"),
                    );
                }
            };
            let report =
                evaluate_requirements(&action.context_requirements, &snapshot, &self.resolver)
                    .await;
            if !report.passed() {
                // a failing required check aborts before any side effect
                return ActionResult::failed(
                    ErrorKind::ContextPrecondition,
                    format!("context validation failed: {}", report.failures.join("; ")),
                );
            }
            warnings = report.warnings;
        }

        let catalogue_action = match self.registry.get(&action.action) {
            Ok(catalogue_action) => catalogue_action,
            Err(err) => return ActionResult::failed(ErrorKind::UnknownAction, err.to_string()),
        };

        let ctx = ActionCtx::new(self.adapter.clone(), self.resolver.clone());
        let params = if action.params.is_null() {
            Value::Object(Default::default())
        } else {
            action.params.clone()
        };
        let timeout_ms = if action.timeout_ms == 0 {
            self.default_timeout_ms
        } else {
            action.timeout_ms
        };

        let mut result = match timeout(
            Duration::from_millis(timeout_ms),
            catalogue_action.invoke(&ctx, params),
        )
        .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                warn!(action = %action.id, error = %err, "handler failed");
                ActionResult::from_error(&err)
            }
            Err(_) => {
                warn!(action = %action.id, timeout_ms, "action timed out");
                ActionResult::failed(
                    ErrorKind::Timeout,
                    format!("action timed out after {timeout_ms} ms"),
                )
            }
        };
        result.warnings.extend(warnings);
        result
    }

    /// Retry wrapper: up to `max_retries` total attempts with exponential
    /// backoff between attempts, for retryable failure kinds only.
    pub async fn execute_with_retry(
        &self,
        action: &EnhancedAction,
        cancel: &CancellationToken,
    ) -> ActionResult {
        let max_attempts = action.max_retries.max(1);
        let mut attempt = 1u32;
        loop {
            if cancel.is_cancelled() {
                return ActionResult::failed(ErrorKind::Cancelled, "plan cancelled before dispatch");
            }
            let result = self.execute_action(action).await;
            if result.success || !result.is_retryable() || attempt >= max_attempts {
                return result.with_metadata("attempts", json!(attempt));
            }
            let delay = self.backoff.delay_for_attempt(attempt);
            debug!(
                action = %action.id,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "retrying after failure"
            );
            sleep(delay).await;
            attempt += 1;
        }
    }

    /// Batch execution. Sequential mode stops at the first failure; parallel
    /// mode launches everything, awaits everything, and returns results in
    /// submission order regardless of completion order.
    pub async fn execute_actions(
        &self,
        actions: &[EnhancedAction],
        mode: BatchMode,
    ) -> Vec<ActionResult> {
        match mode {
            BatchMode::Sequential => {
                let mut results = Vec::new();
                for action in actions {
                    let result = self.execute_action(action).await;
                    let failed = !result.success;
                    results.push(result);
                    if failed {
                        info!(action = %action.id, "sequential batch stopped at first failure");
                        break;
                    }
                }
                results
            }
            BatchMode::Parallel => {
                let mut set: JoinSet<(usize, ActionResult)> = JoinSet::new();
                for (idx, action) in actions.iter().enumerate() {
                    let executor = self.clone();
                    let action = action.clone();
                    set.spawn(async move { (idx, executor.execute_action(&action).await) });
                }
                let mut slots: Vec<Option<ActionResult>> = vec![None; actions.len()];
                while let Some(joined) = set.join_next().await {
                    match joined {
                        Ok((idx, result)) => slots[idx] = Some(result),
                        Err(err) => warn!(error = %err, "batch task aborted"),
                    }
                }
                slots
                    .into_iter()
                    .map(|slot| {
                        slot.unwrap_or_else(|| {
                            ActionResult::failed(ErrorKind::TargetFailure, "execution task aborted")
                        })
                    })
                    .collect()
            }
        }
    }

    /// Execute a dependency-graphed plan.
    ///
    /// Ordering is validated first: a cycle fails the plan before any action
    /// runs. Failures aggregate into the report rather than being thrown.
    pub async fn execute_plan(&self, plan: &ExecutionPlan) -> Result<PlanReport, ExecutorError> {
        self.execute_plan_with_token(plan, CancellationToken::new())
            .await
    }

    pub async fn execute_plan_with_token(
        &self,
        plan: &ExecutionPlan,
        cancel: CancellationToken,
    ) -> Result<PlanReport, ExecutorError> {
        let order = execution_order(&plan.actions)?;
        let started_at = Utc::now();
        let started = Instant::now();
        let index: HashMap<String, EnhancedAction> = plan
            .actions
            .iter()
            .map(|action| (action.id.clone(), action.clone()))
            .collect();
        let mut state = PlanState::new(&plan.actions);
        let width = effective_concurrency(plan);
        let on_error = plan.strategy.error_handling;
        info!(
            plan = %plan.id,
            actions = plan.actions.len(),
            width,
            "executing plan"
        );

        if width <= 1 {
            self.run_ordered(&order, &index, on_error, &cancel, &mut state)
                .await;
        } else {
            let levels = execution_levels(&plan.actions)?;
            self.run_levelled(levels, &index, on_error, width, &cancel, &mut state)
                .await;
        }

        if cancel.is_cancelled() {
            state.halted = true;
        }
        let success = state.unrecovered == 0 && !state.halted;
        if success {
            info!(plan = %plan.id, executed = state.executed_order.len(), "plan completed");
        } else {
            warn!(
                plan = %plan.id,
                unrecovered = state.unrecovered,
                halted = state.halted,
                "plan finished with failures"
            );
        }
        Ok(PlanReport {
            plan_id: plan.id.clone(),
            success,
            halted: state.halted,
            started_at,
            finished_at: Utc::now(),
            latency_ms: started.elapsed().as_millis() as u64,
            results: state.results,
            executed: state.executed_order,
            skipped: state.skipped,
            recovered: state.recovered,
            statuses: state.statuses,
        })
    }

    /// Strictly ordered execution with stop-at-unrecovered-failure.
    async fn run_ordered(
        &self,
        order: &[String],
        index: &HashMap<String, EnhancedAction>,
        on_error: ErrorHandling,
        cancel: &CancellationToken,
        state: &mut PlanState,
    ) {
        for id in order {
            if cancel.is_cancelled() {
                state.halted = true;
                break;
            }
            if state.executed.contains(id) {
                // already ran as another action's fallback
                continue;
            }
            let action = &index[id];
            if !deps_satisfied(action, &state.executed) {
                debug!(action = %id, "skipping: dependencies not executed");
                state.skipped.push(id.clone());
                continue;
            }
            state.statuses.insert(id.clone(), ActionStatus::InProgress);
            let result = self.execute_with_retry(action, cancel).await;
            if matches!(result.error_kind, Some(ErrorKind::Cancelled)) {
                state.statuses.insert(id.clone(), ActionStatus::Pending);
                state.halted = true;
                break;
            }
            state.executed.insert(id.clone());
            state.executed_order.push(id.clone());
            let succeeded = result.success;
            state.statuses.insert(
                id.clone(),
                if succeeded {
                    ActionStatus::Completed
                } else {
                    ActionStatus::Failed
                },
            );
            state.results.push(PlanActionResult {
                action_id: id.clone(),
                fallback_for: None,
                result: result.clone(),
            });
            if succeeded {
                continue;
            }
            let recovered = self.attempt_recovery(action, &result, index, cancel, state).await;
            if recovered {
                state.recovered.push(id.clone());
            } else {
                state.unrecovered += 1;
                if on_error == ErrorHandling::StopOnError {
                    warn!(action = %id, "unrecovered failure, halting plan");
                    state.halted = true;
                    break;
                }
            }
        }
    }

    /// Level-wave execution: one dependency level at a time, actions within a
    /// level concurrently outstanding up to the plan's width. All launched
    /// actions of a level are awaited before failures are processed.
    async fn run_levelled(
        &self,
        levels: Vec<Vec<String>>,
        index: &HashMap<String, EnhancedAction>,
        on_error: ErrorHandling,
        width: usize,
        cancel: &CancellationToken,
        state: &mut PlanState,
    ) {
        for level in levels {
            if state.halted {
                break;
            }
            if cancel.is_cancelled() {
                state.halted = true;
                break;
            }
            let mut runnable = Vec::new();
            for id in level {
                if state.executed.contains(&id) {
                    continue;
                }
                let action = &index[&id];
                if !deps_satisfied(action, &state.executed) {
                    debug!(action = %id, "skipping: dependencies not executed");
                    state.skipped.push(id);
                    continue;
                }
                state.statuses.insert(id.clone(), ActionStatus::InProgress);
                runnable.push(action.clone());
            }
            if runnable.is_empty() {
                continue;
            }

            let level_results = self.run_level(runnable, width, cancel).await;
            for (id, outcome) in level_results {
                let Some(result) = outcome else {
                    // never dispatched (cancelled while queued)
                    state.statuses.insert(id, ActionStatus::Pending);
                    state.halted = true;
                    continue;
                };
                state.executed.insert(id.clone());
                state.executed_order.push(id.clone());
                let succeeded = result.success;
                state.statuses.insert(
                    id.clone(),
                    if succeeded {
                        ActionStatus::Completed
                    } else {
                        ActionStatus::Failed
                    },
                );
                state.results.push(PlanActionResult {
                    action_id: id.clone(),
                    fallback_for: None,
                    result: result.clone(),
                });
                if succeeded {
                    continue;
                }
                let action = &index[&id];
                let recovered = self.attempt_recovery(action, &result, index, cancel, state).await;
                if recovered {
                    state.recovered.push(id);
                } else {
                    state.unrecovered += 1;
                    if on_error == ErrorHandling::StopOnError {
                        warn!(action = %id, "unrecovered failure, halting plan");
                        state.halted = true;
                    }
                }
            }
        }
    }

    /// Run one level's actions with at most `width` concurrently outstanding.
    /// Returns (id, outcome) in level order; `None` marks an action that was
    /// never dispatched because of cancellation.
    async fn run_level(
        &self,
        actions: Vec<EnhancedAction>,
        width: usize,
        cancel: &CancellationToken,
    ) -> Vec<(String, Option<ActionResult>)> {
        let semaphore = Arc::new(Semaphore::new(width.max(1)));
        let mut set: JoinSet<(usize, Option<ActionResult>)> = JoinSet::new();
        for (idx, action) in actions.iter().enumerate() {
            let executor = self.clone();
            let action = action.clone();
            let semaphore = semaphore.clone();
            let cancel = cancel.clone();
            set.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (idx, None);
                };
                if cancel.is_cancelled() {
                    return (idx, None);
                }
                (idx, Some(executor.execute_with_retry(&action, &cancel).await))
            });
        }
        let mut slots: Vec<Option<ActionResult>> = vec![None; actions.len()];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, outcome)) => slots[idx] = outcome,
                Err(err) => warn!(error = %err, "level task aborted"),
            }
        }
        actions
            .into_iter()
            .zip(slots)
            .map(|(action, slot)| (action.id, slot))
            .collect()
    }

    /// Best-effort recovery after a terminal failure: declared in-plan
    /// fallback actions are actually dispatched, in order, through the normal
    /// retry path; the first success recovers the failure. Without a
    /// successful fallback, recovery falls through to kind-based
    /// continuation for target-state drift the planner is expected to replan
    /// around.
    async fn attempt_recovery(
        &self,
        failed: &EnhancedAction,
        failure: &ActionResult,
        index: &HashMap<String, EnhancedAction>,
        cancel: &CancellationToken,
        state: &mut PlanState,
    ) -> bool {
        for fallback_id in &failed.fallback_actions {
            if fallback_id == &failed.id || state.executed.contains(fallback_id) {
                continue;
            }
            let Some(fallback) = index.get(fallback_id) else {
                warn!(
                    action = %failed.id,
                    fallback = %fallback_id,
                    "fallback action not present in plan"
                );
                continue;
            };
            info!(action = %failed.id, fallback = %fallback_id, "dispatching fallback action");
            state
                .statuses
                .insert(fallback_id.clone(), ActionStatus::InProgress);
            let result = self.execute_with_retry(fallback, cancel).await;
            state.executed.insert(fallback_id.clone());
            state.executed_order.push(fallback_id.clone());
            let succeeded = result.success;
            state.statuses.insert(
                fallback_id.clone(),
                if succeeded {
                    ActionStatus::Completed
                } else {
                    ActionStatus::Failed
                },
            );
            state.results.push(PlanActionResult {
                action_id: fallback_id.clone(),
                fallback_for: Some(failed.id.clone()),
                result,
            });
            if succeeded {
                return true;
            }
        }
        matches!(
            failure.error_kind,
            Some(ErrorKind::ElementNotFound) | Some(ErrorKind::Timeout)
        )
    }

    async fn publish(&self, event: ExecutionEvent) {
        if let Err(err) = self.bus.publish(event).await {
            debug!(error = %err, "event not delivered (no subscribers)");
        }
    }
}

fn deps_satisfied(action: &EnhancedAction, executed: &HashSet<String>) -> bool {
    action
        .dependencies
        .iter()
        .all(|dep| executed.contains(dep))
}

/// Concurrency width for a plan. Adaptive mode derives its width from the
/// declared risk level.
fn effective_concurrency(plan: &ExecutionPlan) -> usize {
    match plan.strategy.mode {
        ExecutionMode::Sequential => 1,
        ExecutionMode::Parallel => plan.strategy.max_concurrency.max(1),
        ExecutionMode::Adaptive => match plan.risk_level {
            RiskLevel::High => 1,
            RiskLevel::Medium => plan.strategy.max_concurrency.clamp(1, 2),
            RiskLevel::Low => plan.strategy.max_concurrency.max(1),
        },
    }
}
