//! Error taxonomy for action invocation

use serde::{Deserialize, Serialize};
use thiserror::Error;

use element_resolver::ResolverError;
use target_adapter::TargetError;

/// Typed failure classification attached to every failed result.
///
/// Recovery and retry decisions dispatch on this enumeration, never on
/// substring checks against human-readable messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Invalid or missing parameters; reported immediately, no retry
    InvalidParams,

    /// Action name not present in the catalogue; no retry
    UnknownAction,

    /// A required context precondition failed; no side effect, no retry
    ContextPrecondition,

    /// No element matched; retryable, user-facing condition
    ElementNotFound,

    /// The remote target operation itself failed; retryable
    TargetFailure,

    /// The invocation overran its deadline; retryable
    Timeout,

    /// Plan-structure error (cyclic dependencies); fatal
    PlanStructure,

    /// The invocation was cancelled; terminal
    Cancelled,
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::ElementNotFound | ErrorKind::TargetFailure | ErrorKind::Timeout
        )
    }
}

/// Failures raised at the action-handler boundary.
#[derive(Debug, Error, Clone)]
pub enum ActionError {
    /// Parameters did not match the action's declared schema
    #[error("Invalid parameters for '{action}': {reason}")]
    InvalidParams { action: String, reason: String },

    /// No element matched the requested target
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// The remote target operation failed
    #[error("Target operation failed: {0}")]
    Target(#[from] TargetError),

    /// The invocation overran its deadline
    #[error("Action timed out after {0} ms")]
    Timeout(u64),

    /// The invocation was cancelled before or during dispatch
    #[error("Action cancelled: {0}")]
    Cancelled(String),
}

impl ActionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ActionError::InvalidParams { .. } => ErrorKind::InvalidParams,
            ActionError::ElementNotFound(_) => ErrorKind::ElementNotFound,
            ActionError::Target(_) => ErrorKind::TargetFailure,
            ActionError::Timeout(_) => ErrorKind::Timeout,
            ActionError::Cancelled(_) => ErrorKind::Cancelled,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

impl From<ResolverError> for ActionError {
    fn from(err: ResolverError) -> Self {
        match err {
            ResolverError::InvalidPattern { strategy, pattern } => ActionError::InvalidParams {
                action: "resolve".to_string(),
                reason: format!("invalid {strategy} pattern: {pattern}"),
            },
            ResolverError::Target(err) => ActionError::Target(err),
        }
    }
}

/// Failures raised by the catalogue itself.
#[derive(Debug, Error, Clone)]
pub enum RegistryError {
    /// Registration is append-only; a name can be bound once
    #[error("Action '{0}' is already registered")]
    DuplicateAction(String),

    /// Lookup miss for an unregistered name
    #[error("Unknown action: {0}")]
    UnknownAction(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_kinds() {
        assert!(ErrorKind::ElementNotFound.is_retryable());
        assert!(ErrorKind::TargetFailure.is_retryable());
        assert!(ErrorKind::Timeout.is_retryable());
        assert!(!ErrorKind::InvalidParams.is_retryable());
        assert!(!ErrorKind::ContextPrecondition.is_retryable());
        assert!(!ErrorKind::Cancelled.is_retryable());
    }

    #[test]
    fn action_error_maps_to_kind() {
        let err = ActionError::ElementNotFound("index 4".into());
        assert_eq!(err.kind(), ErrorKind::ElementNotFound);
        assert!(err.is_retryable());

        let err = ActionError::InvalidParams {
            action: "click_element".into(),
            reason: "missing index".into(),
        };
        assert_eq!(err.kind(), ErrorKind::InvalidParams);
        assert!(!err.is_retryable());
    }
}
