//! Action invocation result

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{ActionError, ErrorKind};

/// Structured outcome of a single action invocation.
///
/// Produced once per invocation and immutable after creation; consumed by
/// the orchestrator for history and by the caller for decision-making.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    /// Whether the invocation succeeded.
    pub success: bool,

    /// Handler-provided payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Human-readable failure message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Typed failure classification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,

    /// Non-fatal observations collected during the invocation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    /// Wall-clock duration of the invocation in milliseconds.
    pub timing_ms: u64,

    /// Invocation metadata (action id, agent id, attempt counters).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl ActionResult {
    /// Successful result carrying a payload.
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_kind: None,
            warnings: Vec::new(),
            timing_ms: 0,
            metadata: Map::new(),
        }
    }

    /// Successful result without payload.
    pub fn ok_empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            error_kind: None,
            warnings: Vec::new(),
            timing_ms: 0,
            metadata: Map::new(),
        }
    }

    /// Failed result with an explicit kind and message.
    pub fn failed(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            error_kind: Some(kind),
            warnings: Vec::new(),
            timing_ms: 0,
            metadata: Map::new(),
        }
    }

    /// Failed result derived from a handler-boundary error.
    pub fn from_error(err: &ActionError) -> Self {
        Self::failed(err.kind(), err.to_string())
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_timing(mut self, timing_ms: u64) -> Self {
        self.timing_ms = timing_ms;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Whether the recorded failure is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        !self.success
            && self
                .error_kind
                .map(|kind| kind.is_retryable())
                .unwrap_or(false)
    }
}
