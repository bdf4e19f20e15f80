//! Typed parameter structs for the built-in actions.
//!
//! Each struct doubles as the schema advertised to the upstream planner:
//! deserialization failure is an `InvalidParams` error, reported immediately
//! and never retried.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use element_resolver::SelectorStrategy;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NavigateParams {
    /// Absolute URL to open in the active tab.
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OpenTabParams {
    /// Absolute URL to open in the new tab.
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwitchTabParams {
    /// Identifier of the tab to focus.
    pub tab_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CloseTabParams {
    /// Identifier of the tab to close.
    pub tab_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClickParams {
    /// Interactive index of the element to click.
    pub index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InputTextParams {
    /// Interactive index of the form control.
    pub index: usize,

    /// Text to type.
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SendKeysParams {
    /// Key chord string, e.g. "Enter" or "Control+a".
    pub keys: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScrollToPercentParams {
    /// Vertical position in [0, 100].
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScrollToTextParams {
    /// Text to bring into view.
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DropdownOptionsParams {
    /// Interactive index of the dropdown element.
    pub index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SelectDropdownParams {
    /// Interactive index of the dropdown element.
    pub index: usize,

    /// Option value to select.
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FindElementParams {
    /// Location strategy to try first.
    pub strategy: SelectorStrategy,

    /// Strategy pattern (CSS selector, XPath, text, "name=value", "x,y").
    pub pattern: String,

    /// Base confidence in [0, 1].
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    0.5
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WaitParams {
    /// Fixed duration to wait, in milliseconds.
    pub duration_ms: u64,
}

/// Marker for actions that take no parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct EmptyParams {}
