//! Execution orchestrator.
//!
//! Runs single actions, action batches (sequential or concurrent) and full
//! dependency-graphed plans against the action catalogue. Validates context
//! preconditions before dispatch, bounds every invocation by its timeout,
//! retries transient failures with exponential backoff, attempts fallback
//! recovery on terminal failures, and publishes progress events for every
//! start and terminal outcome. Nothing below the single-action boundary is
//! allowed to propagate an error past the orchestrator: every failure
//! becomes a typed result.

pub mod context;
pub mod errors;
pub mod executor;
pub mod history;
pub mod ordering;
pub mod retry;
pub mod types;

pub use context::{ContextCheck, ContextReport, ContextRequirement, ContextSnapshot};
pub use errors::ExecutorError;
pub use executor::PlanExecutor;
pub use history::{ExecutionHistory, HistoryEntry};
pub use ordering::{execution_levels, execution_order};
pub use retry::BackoffPolicy;
pub use types::{
    ActionStatus, BatchMode, EnhancedAction, ErrorHandling, ExecutionMode, ExecutionPlan,
    ExecutionStrategy, ExecutorStats, PlanActionResult, PlanReport, RiskLevel,
};
