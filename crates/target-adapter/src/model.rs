//! Data model for the target environment surface

use std::collections::{BTreeMap, HashMap};

use pagepilot_core_types::TabId;
use serde::{Deserialize, Serialize};

/// Layout box of an element in page coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the box occupies any area at all.
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Whether a page-coordinate point falls inside the box.
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }
}

/// Style bits relevant to visibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComputedStyle {
    pub display_none: bool,
    pub visibility_hidden: bool,
    pub opacity: f64,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display_none: false,
            visibility_hidden: false,
            opacity: 1.0,
        }
    }
}

/// A single inspectable element as reported by the target.
///
/// Nodes are value snapshots, never live handles: the underlying remote
/// element may disappear between calls, so staleness is tolerated by the
/// layers above rather than assumed away.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementNode {
    /// Interactive index assigned in document order, if any.
    pub index: Option<usize>,

    /// Generated unique locator path for this node.
    pub locator: String,

    /// Lowercase tag name.
    pub tag: String,

    /// Visible text content.
    pub text: String,

    /// Raw attribute map.
    pub attributes: HashMap<String, String>,

    /// Layout box.
    pub bbox: BoundingBox,

    /// Style bits relevant to visibility.
    pub style: ComputedStyle,
}

impl ElementNode {
    pub fn new(locator: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            index: None,
            locator: locator.into(),
            tag: tag.into().to_ascii_lowercase(),
            text: String::new(),
            attributes: HashMap::new(),
            bbox: BoundingBox::default(),
            style: ComputedStyle::default(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = bbox;
        self
    }

    pub fn with_style(mut self, style: ComputedStyle) -> Self {
        self.style = style;
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn role(&self) -> Option<&str> {
        self.attribute("role")
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }
}

/// Identity of the currently focused page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    pub tab: TabId,
    pub url: String,
    pub title: String,
}

/// One open tab as reported by the target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: TabId,
    pub url: String,
    pub title: String,
    pub active: bool,
}

/// Index-keyed element map of the focused page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageState {
    pub url: String,
    pub title: String,
    pub elements: BTreeMap<usize, ElementNode>,
}

impl PageState {
    /// Look up an element by its interactive index.
    pub fn element(&self, index: usize) -> Option<&ElementNode> {
        self.elements.get(&index)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// One option inside a dropdown/listbox element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropdownOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Direction for whole-page scrolling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageDirection {
    Previous,
    Next,
}
