//! Typed progress events published by the execution orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle state of an executing action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// Action dispatch has started.
    Start,

    /// Action finished successfully.
    Ok,

    /// Action finished with a failure.
    Fail,
}

/// Progress event emitted once per action start and once per terminal outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionEvent {
    /// Identity of the executing agent.
    pub actor: String,

    /// Lifecycle state this event announces.
    pub state: Lifecycle,

    /// When the event was emitted.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Identifier of the scheduled action instance.
    pub action_id: String,

    /// Catalogue name of the action.
    pub action: String,

    /// Free-form payload (result data or error details).
    pub payload: Value,
}

impl ExecutionEvent {
    pub fn started(actor: impl Into<String>, action_id: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            state: Lifecycle::Start,
            timestamp: Utc::now(),
            action_id: action_id.into(),
            action: action.into(),
            payload: Value::Null,
        }
    }

    pub fn succeeded(
        actor: impl Into<String>,
        action_id: impl Into<String>,
        action: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            actor: actor.into(),
            state: Lifecycle::Ok,
            timestamp: Utc::now(),
            action_id: action_id.into(),
            action: action.into(),
            payload,
        }
    }

    pub fn failed(
        actor: impl Into<String>,
        action_id: impl Into<String>,
        action: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            actor: actor.into(),
            state: Lifecycle::Fail,
            timestamp: Utc::now(),
            action_id: action_id.into(),
            action: action.into(),
            payload: serde_json::json!({ "error": error.into() }),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, Lifecycle::Ok | Lifecycle::Fail)
    }
}
