//! Core types for the resolution engine

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use target_adapter::{BoundingBox, ElementNode};

/// Location strategy for a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SelectorStrategy {
    /// CSS selector matching
    Css,

    /// XPath expression matching
    XPath,

    /// Text content matching
    Text,

    /// `name=value` attribute matching
    Attribute,

    /// Page-coordinate point matching ("x,y")
    Visual,
}

impl SelectorStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            SelectorStrategy::Css => "css",
            SelectorStrategy::XPath => "xpath",
            SelectorStrategy::Text => "text",
            SelectorStrategy::Attribute => "attribute",
            SelectorStrategy::Visual => "visual",
        }
    }
}

/// Abstract description of how to locate a target element.
///
/// Selectors are value objects, constructed per call and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selector {
    pub strategy: SelectorStrategy,
    pub pattern: String,

    /// Base confidence in [0, 1]; the starting point of candidate scoring.
    pub confidence: f64,

    /// Explicit fallbacks, tried in order after the primary and before
    /// auto-derived fallbacks fail.
    #[serde(default)]
    pub fallback_selectors: Vec<Selector>,
}

impl Selector {
    pub fn new(strategy: SelectorStrategy, pattern: impl Into<String>) -> Self {
        Self {
            strategy,
            pattern: pattern.into(),
            confidence: 0.5,
            fallback_selectors: Vec::new(),
        }
    }

    pub fn css(pattern: impl Into<String>) -> Self {
        Self::new(SelectorStrategy::Css, pattern)
    }

    pub fn xpath(pattern: impl Into<String>) -> Self {
        Self::new(SelectorStrategy::XPath, pattern)
    }

    pub fn text(pattern: impl Into<String>) -> Self {
        Self::new(SelectorStrategy::Text, pattern)
    }

    pub fn attribute(name: &str, value: &str) -> Self {
        Self::new(SelectorStrategy::Attribute, format!("{name}={value}"))
    }

    pub fn visual(x: f64, y: f64) -> Self {
        Self::new(SelectorStrategy::Visual, format!("{x},{y}"))
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_fallback(mut self, fallback: Selector) -> Self {
        self.fallback_selectors.push(fallback);
        self
    }

    /// Compact form for logging.
    pub fn describe(&self) -> String {
        format!("{}:{}", self.strategy.name(), self.pattern)
    }
}

/// A resolved candidate element.
///
/// Transient: recomputed on every resolution, cached only as a value. The
/// underlying remote element may disappear between calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementInfo {
    /// Generated unique locator path.
    pub locator: String,

    /// Interactive index, if the target assigned one.
    pub index: Option<usize>,

    /// Lowercase tag name.
    pub tag: String,

    /// Visible text content.
    pub text: String,

    /// Computed from layout box + style bits.
    pub visible: bool,

    /// Computed from tag/role/attribute heuristics.
    pub interactive: bool,

    /// Raw attribute map.
    pub attributes: HashMap<String, String>,

    /// Layout box.
    pub bbox: BoundingBox,
}

impl ElementInfo {
    pub fn from_node(node: &ElementNode) -> Self {
        Self {
            locator: node.locator.clone(),
            index: node.index,
            tag: node.tag.clone(),
            text: node.text.clone(),
            visible: is_visible(node),
            interactive: is_interactive(node),
            attributes: node.attributes.clone(),
            bbox: node.bbox,
        }
    }
}

impl From<&ElementNode> for ElementInfo {
    fn from(node: &ElementNode) -> Self {
        Self::from_node(node)
    }
}

/// Visibility: non-zero layout box, not hidden, non-zero opacity.
fn is_visible(node: &ElementNode) -> bool {
    node.bbox.has_area()
        && !node.style.display_none
        && !node.style.visibility_hidden
        && node.style.opacity > 0.0
}

const INTERACTIVE_TAGS: [&str; 6] = ["a", "button", "input", "select", "textarea", "option"];
const INTERACTIVE_ROLES: [&str; 6] = ["button", "link", "checkbox", "menuitem", "tab", "textbox"];

/// Interactivity: anchor/button/form-control tags, click handlers, ARIA
/// button/link-like roles, or editable hosts.
fn is_interactive(node: &ElementNode) -> bool {
    INTERACTIVE_TAGS.contains(&node.tag.as_str())
        || node.attribute("onclick").is_some()
        || node.attribute("contenteditable").is_some()
        || node
            .role()
            .map(|role| INTERACTIVE_ROLES.contains(&role))
            .unwrap_or(false)
}
