//! Error types for the resolution engine

use thiserror::Error;

use target_adapter::TargetError;

/// Failures surfaced by element resolution.
///
/// A miss (no strategy yielded a match) is not represented here: callers get
/// an empty result set or `None` and treat it as a retryable condition.
#[derive(Debug, Error, Clone)]
pub enum ResolverError {
    /// A strategy pattern could not be interpreted
    #[error("Invalid pattern for {strategy} strategy: {pattern}")]
    InvalidPattern { strategy: &'static str, pattern: String },

    /// The target failed while a strategy was being evaluated
    #[error("Target operation failed: {0}")]
    Target(#[from] TargetError),
}
