//! The adapter trait driven by the action engine

use async_trait::async_trait;
use pagepilot_core_types::TabId;

use crate::errors::TargetError;
use crate::model::{DropdownOption, ElementNode, PageDirection, PageInfo, PageState, TabInfo};

/// Capability set of the remote target environment.
///
/// The engine treats this collaborator as opaque: every operation may fail
/// and the failure is caught at the action-handler boundary, never allowed
/// to propagate past the orchestrator.
#[async_trait]
pub trait TargetAdapter: Send + Sync {
    /// Navigate the active tab to a URL.
    async fn navigate(&self, url: &str) -> Result<(), TargetError>;

    /// Identity of the currently focused page.
    async fn current_page(&self) -> Result<PageInfo, TargetError>;

    /// Fresh index-keyed element map of the focused page.
    async fn page_state(&self) -> Result<PageState, TargetError>;

    /// Last computed element map; may be reused as a performance hint.
    /// Callers must tolerate staleness - the target mutates between calls.
    async fn cached_state(&self) -> Result<PageState, TargetError>;

    /// Click an element node.
    async fn click_node(&self, node: &ElementNode) -> Result<(), TargetError>;

    /// Type text into a form-control node.
    async fn input_text(&self, node: &ElementNode, text: &str) -> Result<(), TargetError>;

    /// Send raw key chords to the focused page.
    async fn send_keys(&self, keys: &str) -> Result<(), TargetError>;

    /// Scroll to a vertical position expressed as a percentage [0, 100].
    async fn scroll_to_percent(&self, percent: f64) -> Result<(), TargetError>;

    /// Scroll until the given text becomes visible; returns whether it was found.
    async fn scroll_to_text(&self, text: &str) -> Result<bool, TargetError>;

    /// Scroll one viewport backwards or forwards.
    async fn scroll_page(&self, direction: PageDirection) -> Result<(), TargetError>;

    /// Focus an existing tab.
    async fn switch_tab(&self, tab: &TabId) -> Result<(), TargetError>;

    /// Open a new tab at the given URL and focus it.
    async fn open_tab(&self, url: &str) -> Result<TabId, TargetError>;

    /// Close a tab.
    async fn close_tab(&self, tab: &TabId) -> Result<(), TargetError>;

    /// All open tabs in creation order.
    async fn all_tabs(&self) -> Result<Vec<TabInfo>, TargetError>;

    /// Options of a dropdown/listbox node.
    async fn dropdown_options(&self, node: &ElementNode) -> Result<Vec<DropdownOption>, TargetError>;

    /// Select a dropdown option by value; returns the selected label.
    async fn select_dropdown_option(
        &self,
        node: &ElementNode,
        value: &str,
    ) -> Result<String, TargetError>;

    /// Evaluate a CSS selector, optionally scoped to a subtree locator.
    async fn query_css(
        &self,
        scope: Option<&str>,
        selector: &str,
    ) -> Result<Vec<ElementNode>, TargetError>;

    /// Evaluate an XPath expression, optionally scoped to a subtree locator.
    async fn query_xpath(
        &self,
        scope: Option<&str>,
        expression: &str,
    ) -> Result<Vec<ElementNode>, TargetError>;

    /// Extract the readable text of the focused page.
    async fn extract_text(&self) -> Result<String, TargetError>;
}
