//! Error types for plan orchestration

use thiserror::Error;

/// Plan-structure failures, detected before any action runs.
#[derive(Debug, Error, Clone)]
pub enum ExecutorError {
    /// The action dependency graph contains a cycle
    #[error("Cyclic dependency detected at action '{action_id}'")]
    CyclicDependency { action_id: String },

    /// Two scheduled actions share an id
    #[error("Duplicate action id in plan: {0}")]
    DuplicateActionId(String),
}
