//! Error types for remote target operations

use thiserror::Error;

/// Failures surfaced by the target environment.
#[derive(Debug, Error, Clone)]
pub enum TargetError {
    /// Navigation could not reach the requested URL
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// No tab is active (all closed or none opened yet)
    #[error("No active tab")]
    NoActiveTab,

    /// Referenced tab does not exist
    #[error("Tab not found: {0}")]
    TabNotFound(String),

    /// Referenced element disappeared between resolution and use
    #[error("Stale element: {0}")]
    StaleElement(String),

    /// Element exists but does not accept the requested interaction
    #[error("Element not interactable: {0}")]
    NotInteractable(String),

    /// Dropdown option was not found
    #[error("Option not found in dropdown: {0}")]
    OptionNotFound(String),

    /// Query pattern could not be parsed by the target
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// Transport-level failure talking to the target
    #[error("Target I/O error: {0}")]
    Io(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TargetError {
    /// Check if this error is retryable: the target may recover on a later
    /// attempt (the page settles, the element reappears, the link flaps back).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TargetError::StaleElement(_) | TargetError::NotInteractable(_) | TargetError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_failures_are_retryable() {
        assert!(TargetError::StaleElement("#btn".into()).is_retryable());
        assert!(TargetError::Io("socket closed".into()).is_retryable());
        assert!(!TargetError::TabNotFound("t1".into()).is_retryable());
        assert!(!TargetError::InvalidSelector(":::".into()).is_retryable());
    }
}
