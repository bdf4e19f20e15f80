//! In-memory target backend.
//!
//! Simulates a small set of navigable pages with inspectable elements so the
//! engine can be exercised without a live browser. Supports the subset of
//! CSS/XPath queries the resolver emits.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use pagepilot_core_types::TabId;

use crate::adapter::TargetAdapter;
use crate::errors::TargetError;
use crate::model::{
    DropdownOption, ElementNode, PageDirection, PageInfo, PageState, TabInfo,
};

/// One registered page of the simulated target.
#[derive(Debug, Clone, Default)]
pub struct StubPage {
    pub title: String,
    pub body_text: String,
    pub elements: Vec<ElementNode>,
    pub dropdowns: HashMap<String, Vec<DropdownOption>>,
}

impl StubPage {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_element(mut self, node: ElementNode) -> Self {
        self.elements.push(node);
        self
    }

    pub fn with_body_text(mut self, text: impl Into<String>) -> Self {
        self.body_text = text.into();
        self
    }

    /// Register dropdown options for the element at `locator`.
    pub fn with_dropdown(mut self, locator: impl Into<String>, options: Vec<DropdownOption>) -> Self {
        self.dropdowns.insert(locator.into(), options);
        self
    }
}

#[derive(Debug, Clone)]
struct TabEntry {
    id: TabId,
    url: String,
}

#[derive(Default)]
struct StubState {
    pages: HashMap<String, StubPage>,
    tabs: Vec<TabEntry>,
    active: Option<usize>,
    scroll_percent: f64,
    cached: Option<PageState>,
    clicks: Vec<String>,
    inputs: Vec<(String, String)>,
    keys: Vec<String>,
}

impl StubState {
    fn active_tab(&self) -> Result<&TabEntry, TargetError> {
        self.active
            .and_then(|idx| self.tabs.get(idx))
            .ok_or(TargetError::NoActiveTab)
    }

    fn active_page(&self) -> Result<&StubPage, TargetError> {
        let tab = self.active_tab()?;
        self.pages
            .get(&tab.url)
            .ok_or_else(|| TargetError::Internal(format!("page missing for {}", tab.url)))
    }

    fn build_state(&self) -> Result<PageState, TargetError> {
        let tab = self.active_tab()?;
        let page = self.active_page()?;
        let mut state = PageState {
            url: tab.url.clone(),
            title: page.title.clone(),
            elements: Default::default(),
        };
        for (idx, node) in page.elements.iter().enumerate() {
            let mut node = node.clone();
            node.index = Some(idx);
            state.elements.insert(idx, node);
        }
        Ok(state)
    }
}

/// In-memory [`TargetAdapter`] implementation.
pub struct StubTarget {
    state: RwLock<StubState>,
}

impl StubTarget {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StubState::default()),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a page reachable by navigation.
    pub fn register_page(&self, url: impl Into<String>, page: StubPage) {
        self.state.write().pages.insert(url.into(), page);
    }

    /// Locators clicked so far, in order.
    pub fn clicks(&self) -> Vec<String> {
        self.state.read().clicks.clone()
    }

    /// (locator, text) pairs typed so far, in order.
    pub fn inputs(&self) -> Vec<(String, String)> {
        self.state.read().inputs.clone()
    }

    /// Key chords sent so far, in order.
    pub fn sent_keys(&self) -> Vec<String> {
        self.state.read().keys.clone()
    }

    /// Current scroll position in percent.
    pub fn scroll_position(&self) -> f64 {
        self.state.read().scroll_percent
    }

    fn navigate_inner(state: &mut StubState, url: &str) -> Result<(), TargetError> {
        if !state.pages.contains_key(url) {
            return Err(TargetError::NavigationFailed(format!("no route to {url}")));
        }
        match state.active {
            Some(idx) => state.tabs[idx].url = url.to_string(),
            None => {
                state.tabs.push(TabEntry {
                    id: TabId::new(),
                    url: url.to_string(),
                });
                state.active = Some(0);
            }
        }
        state.cached = None;
        state.scroll_percent = 0.0;
        Ok(())
    }
}

impl Default for StubTarget {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TargetAdapter for StubTarget {
    async fn navigate(&self, url: &str) -> Result<(), TargetError> {
        debug!(url, "stub navigate");
        let mut state = self.state.write();
        Self::navigate_inner(&mut state, url)
    }

    async fn current_page(&self) -> Result<PageInfo, TargetError> {
        let state = self.state.read();
        let tab = state.active_tab()?;
        let page = state.active_page()?;
        Ok(PageInfo {
            tab: tab.id.clone(),
            url: tab.url.clone(),
            title: page.title.clone(),
        })
    }

    async fn page_state(&self) -> Result<PageState, TargetError> {
        let mut state = self.state.write();
        let built = state.build_state()?;
        state.cached = Some(built.clone());
        Ok(built)
    }

    async fn cached_state(&self) -> Result<PageState, TargetError> {
        {
            let state = self.state.read();
            if let Some(cached) = &state.cached {
                return Ok(cached.clone());
            }
        }
        self.page_state().await
    }

    async fn click_node(&self, node: &ElementNode) -> Result<(), TargetError> {
        let mut state = self.state.write();
        let target_url = {
            let page = state.active_page()?;
            let found = page
                .elements
                .iter()
                .find(|el| el.locator == node.locator)
                .ok_or_else(|| TargetError::StaleElement(node.locator.clone()))?;
            found.attribute("data-nav").map(str::to_string)
        };
        state.clicks.push(node.locator.clone());
        state.cached = None;
        if let Some(url) = target_url {
            Self::navigate_inner(&mut state, &url)?;
        }
        Ok(())
    }

    async fn input_text(&self, node: &ElementNode, text: &str) -> Result<(), TargetError> {
        const EDITABLE: [&str; 3] = ["input", "textarea", "select"];
        let mut state = self.state.write();
        let url = state.active_tab()?.url.clone();
        let page = state
            .pages
            .get_mut(&url)
            .ok_or_else(|| TargetError::Internal(format!("page missing for {url}")))?;
        let found = page
            .elements
            .iter_mut()
            .find(|el| el.locator == node.locator)
            .ok_or_else(|| TargetError::StaleElement(node.locator.clone()))?;
        let editable = EDITABLE.contains(&found.tag.as_str())
            || found.attribute("contenteditable").is_some();
        if !editable {
            return Err(TargetError::NotInteractable(node.locator.clone()));
        }
        found.attributes.insert("value".to_string(), text.to_string());
        state.inputs.push((node.locator.clone(), text.to_string()));
        state.cached = None;
        Ok(())
    }

    async fn send_keys(&self, keys: &str) -> Result<(), TargetError> {
        let mut state = self.state.write();
        state.active_tab()?;
        state.keys.push(keys.to_string());
        Ok(())
    }

    async fn scroll_to_percent(&self, percent: f64) -> Result<(), TargetError> {
        let mut state = self.state.write();
        state.active_tab()?;
        state.scroll_percent = percent.clamp(0.0, 100.0);
        Ok(())
    }

    async fn scroll_to_text(&self, text: &str) -> Result<bool, TargetError> {
        let state = self.state.read();
        let page = state.active_page()?;
        let found =
            page.body_text.contains(text) || page.elements.iter().any(|el| el.text.contains(text));
        Ok(found)
    }

    async fn scroll_page(&self, direction: PageDirection) -> Result<(), TargetError> {
        let mut state = self.state.write();
        state.active_tab()?;
        let delta = match direction {
            PageDirection::Previous => -90.0,
            PageDirection::Next => 90.0,
        };
        state.scroll_percent = (state.scroll_percent + delta).clamp(0.0, 100.0);
        Ok(())
    }

    async fn switch_tab(&self, tab: &TabId) -> Result<(), TargetError> {
        let mut state = self.state.write();
        let idx = state
            .tabs
            .iter()
            .position(|entry| &entry.id == tab)
            .ok_or_else(|| TargetError::TabNotFound(tab.0.clone()))?;
        state.active = Some(idx);
        state.cached = None;
        Ok(())
    }

    async fn open_tab(&self, url: &str) -> Result<TabId, TargetError> {
        let mut state = self.state.write();
        if !state.pages.contains_key(url) {
            return Err(TargetError::NavigationFailed(format!("no route to {url}")));
        }
        let id = TabId::new();
        state.tabs.push(TabEntry {
            id: id.clone(),
            url: url.to_string(),
        });
        state.active = Some(state.tabs.len() - 1);
        state.cached = None;
        state.scroll_percent = 0.0;
        Ok(id)
    }

    async fn close_tab(&self, tab: &TabId) -> Result<(), TargetError> {
        let mut state = self.state.write();
        let idx = state
            .tabs
            .iter()
            .position(|entry| &entry.id == tab)
            .ok_or_else(|| TargetError::TabNotFound(tab.0.clone()))?;
        state.tabs.remove(idx);
        state.active = match state.active {
            Some(active) if active == idx => state.tabs.len().checked_sub(1),
            Some(active) if active > idx => Some(active - 1),
            other => other,
        };
        state.cached = None;
        Ok(())
    }

    async fn all_tabs(&self) -> Result<Vec<TabInfo>, TargetError> {
        let state = self.state.read();
        Ok(state
            .tabs
            .iter()
            .enumerate()
            .map(|(idx, entry)| TabInfo {
                id: entry.id.clone(),
                url: entry.url.clone(),
                title: state
                    .pages
                    .get(&entry.url)
                    .map(|page| page.title.clone())
                    .unwrap_or_default(),
                active: state.active == Some(idx),
            })
            .collect())
    }

    async fn dropdown_options(&self, node: &ElementNode) -> Result<Vec<DropdownOption>, TargetError> {
        let state = self.state.read();
        let page = state.active_page()?;
        if !page.elements.iter().any(|el| el.locator == node.locator) {
            return Err(TargetError::StaleElement(node.locator.clone()));
        }
        Ok(page.dropdowns.get(&node.locator).cloned().unwrap_or_default())
    }

    async fn select_dropdown_option(
        &self,
        node: &ElementNode,
        value: &str,
    ) -> Result<String, TargetError> {
        let mut state = self.state.write();
        let url = state.active_tab()?.url.clone();
        let page = state
            .pages
            .get_mut(&url)
            .ok_or_else(|| TargetError::Internal(format!("page missing for {url}")))?;
        let options = page
            .dropdowns
            .get_mut(&node.locator)
            .ok_or_else(|| TargetError::StaleElement(node.locator.clone()))?;
        let mut label = None;
        for option in options.iter_mut() {
            option.selected = option.value == value;
            if option.selected {
                label = Some(option.label.clone());
            }
        }
        state.cached = None;
        label.ok_or_else(|| TargetError::OptionNotFound(value.to_string()))
    }

    async fn query_css(
        &self,
        scope: Option<&str>,
        selector: &str,
    ) -> Result<Vec<ElementNode>, TargetError> {
        let state = self.state.read();
        let built = state.build_state()?;
        let compound = parse_compound(selector)?;
        Ok(built
            .elements
            .into_values()
            .filter(|node| in_scope(node, scope) && compound.matches(node))
            .collect())
    }

    async fn query_xpath(
        &self,
        scope: Option<&str>,
        expression: &str,
    ) -> Result<Vec<ElementNode>, TargetError> {
        let state = self.state.read();
        let built = state.build_state()?;
        let matcher = parse_xpath(expression)?;
        Ok(built
            .elements
            .into_values()
            .filter(|node| in_scope(node, scope) && matcher.matches(node))
            .collect())
    }

    async fn extract_text(&self) -> Result<String, TargetError> {
        let state = self.state.read();
        let page = state.active_page()?;
        let mut parts = vec![page.title.clone()];
        parts.extend(page.elements.iter().map(|el| el.text.clone()));
        parts.push(page.body_text.clone());
        Ok(parts
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

fn in_scope(node: &ElementNode, scope: Option<&str>) -> bool {
    match scope {
        Some(prefix) => node.locator.starts_with(prefix),
        None => true,
    }
}

/// Parsed form of a single compound CSS selector.
#[derive(Debug, Default)]
struct CompoundSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, String)>,
    contains_text: Option<String>,
}

impl CompoundSelector {
    fn matches(&self, node: &ElementNode) -> bool {
        if let Some(tag) = &self.tag {
            if node.tag != *tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if node.id() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class_attr = node.attribute("class").unwrap_or_default();
            let present: Vec<&str> = class_attr.split_whitespace().collect();
            if !self.classes.iter().all(|c| present.contains(&c.as_str())) {
                return false;
            }
        }
        for (name, value) in &self.attributes {
            if node.attribute(name) != Some(value.as_str()) {
                return false;
            }
        }
        if let Some(text) = &self.contains_text {
            if !node.text.contains(text.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Parse the subset of CSS this backend supports: a compound selector of
/// tag, `#id`, `.class`, `[attr="value"]` parts with an optional
/// `:contains("text")` suffix. Descendant combinators degrade to their last
/// segment.
fn parse_compound(selector: &str) -> Result<CompoundSelector, TargetError> {
    let trimmed = selector.trim();
    if trimmed.is_empty() {
        return Err(TargetError::InvalidSelector(selector.to_string()));
    }
    let mut segment = trimmed
        .split_whitespace()
        .last()
        .unwrap_or(trimmed)
        .trim_start_matches('>')
        .trim()
        .to_string();

    let mut compound = CompoundSelector::default();

    if let Some(start) = segment.find(":contains(") {
        let tail = &segment[start + ":contains(".len()..];
        let end = tail
            .find(')')
            .ok_or_else(|| TargetError::InvalidSelector(selector.to_string()))?;
        compound.contains_text = Some(tail[..end].trim_matches(['"', '\''].as_ref()).to_string());
        segment.truncate(start);
    }

    while let Some(start) = segment.find('[') {
        let end = segment[start..]
            .find(']')
            .map(|offset| start + offset)
            .ok_or_else(|| TargetError::InvalidSelector(selector.to_string()))?;
        let body = segment[start + 1..end].to_string();
        let (name, value) = body
            .split_once('=')
            .ok_or_else(|| TargetError::InvalidSelector(selector.to_string()))?;
        compound.attributes.push((
            name.trim().to_string(),
            value.trim().trim_matches(['"', '\''].as_ref()).to_string(),
        ));
        segment.replace_range(start..=end, "");
    }

    let mut rest = segment.as_str();
    while !rest.is_empty() {
        let (kind, tail) = match rest.as_bytes()[0] {
            b'#' => ('#', &rest[1..]),
            b'.' => ('.', &rest[1..]),
            _ => ('t', rest),
        };
        let end = tail.find(['#', '.']).unwrap_or(tail.len());
        let token = &tail[..end];
        if token.is_empty() {
            return Err(TargetError::InvalidSelector(selector.to_string()));
        }
        match kind {
            '#' => compound.id = Some(token.to_string()),
            '.' => compound.classes.push(token.to_string()),
            _ => {
                if token != "*" {
                    compound.tag = Some(token.to_ascii_lowercase());
                }
            }
        }
        rest = &tail[end..];
    }
    Ok(compound)
}

/// Parsed form of the XPath subset: `//tag`, `//*`, with an optional
/// `[@attr='value']` or `[text()='value']` predicate.
#[derive(Debug, Default)]
struct XPathMatcher {
    tag: Option<String>,
    attribute: Option<(String, String)>,
    text_equals: Option<String>,
}

impl XPathMatcher {
    fn matches(&self, node: &ElementNode) -> bool {
        if let Some(tag) = &self.tag {
            if node.tag != *tag {
                return false;
            }
        }
        if let Some((name, value)) = &self.attribute {
            if node.attribute(name) != Some(value.as_str()) {
                return false;
            }
        }
        if let Some(text) = &self.text_equals {
            if node.text != *text {
                return false;
            }
        }
        true
    }
}

fn parse_xpath(expression: &str) -> Result<XPathMatcher, TargetError> {
    let trimmed = expression.trim();
    let rest = trimmed
        .strip_prefix("//")
        .ok_or_else(|| TargetError::InvalidSelector(expression.to_string()))?;

    let (name, predicate) = match rest.find('[') {
        Some(start) => {
            let end = rest
                .rfind(']')
                .ok_or_else(|| TargetError::InvalidSelector(expression.to_string()))?;
            (&rest[..start], Some(&rest[start + 1..end]))
        }
        None => (rest, None),
    };

    let mut matcher = XPathMatcher::default();
    if name != "*" {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(TargetError::InvalidSelector(expression.to_string()));
        }
        matcher.tag = Some(name.to_ascii_lowercase());
    }

    if let Some(predicate) = predicate {
        if let Some(body) = predicate.strip_prefix('@') {
            let (attr, value) = body
                .split_once('=')
                .ok_or_else(|| TargetError::InvalidSelector(expression.to_string()))?;
            matcher.attribute = Some((
                attr.trim().to_string(),
                value.trim().trim_matches(['"', '\''].as_ref()).to_string(),
            ));
        } else if let Some(body) = predicate.strip_prefix("text()=") {
            matcher.text_equals = Some(body.trim().trim_matches(['"', '\''].as_ref()).to_string());
        } else {
            return Err(TargetError::InvalidSelector(expression.to_string()));
        }
    }

    Ok(matcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundingBox;

    fn seeded() -> StubTarget {
        let target = StubTarget::new();
        target.register_page(
            "https://example.com",
            StubPage::new("Example")
                .with_element(
                    ElementNode::new("body>a:nth(0)", "a")
                        .with_text("Docs")
                        .with_attribute("href", "/docs")
                        .with_bbox(BoundingBox::new(0.0, 0.0, 80.0, 20.0)),
                )
                .with_element(
                    ElementNode::new("body>input:nth(1)", "input")
                        .with_attribute("id", "search")
                        .with_attribute("class", "field wide")
                        .with_bbox(BoundingBox::new(0.0, 30.0, 200.0, 24.0)),
                )
                .with_body_text("Welcome to the example page"),
        );
        target
    }

    #[tokio::test]
    async fn navigate_and_read_state() {
        let target = seeded();
        target.navigate("https://example.com").await.unwrap();
        let state = target.page_state().await.unwrap();
        assert_eq!(state.title, "Example");
        assert_eq!(state.len(), 2);
        assert_eq!(state.element(0).unwrap().tag, "a");
    }

    #[tokio::test]
    async fn navigate_to_unknown_url_fails() {
        let target = seeded();
        let err = target.navigate("https://nowhere.invalid").await.unwrap_err();
        assert!(matches!(err, TargetError::NavigationFailed(_)));
    }

    #[tokio::test]
    async fn css_queries_match_id_class_and_attribute() {
        let target = seeded();
        target.navigate("https://example.com").await.unwrap();

        let by_id = target.query_css(None, "#search").await.unwrap();
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].tag, "input");

        let by_class = target.query_css(None, "input.field").await.unwrap();
        assert_eq!(by_class.len(), 1);

        let by_attr = target
            .query_css(None, "a[href=\"/docs\"]")
            .await
            .unwrap();
        assert_eq!(by_attr.len(), 1);

        let by_contains = target
            .query_css(None, "a:contains(\"Docs\")")
            .await
            .unwrap();
        assert_eq!(by_contains.len(), 1);
    }

    #[tokio::test]
    async fn xpath_queries_match_tag_and_attribute() {
        let target = seeded();
        target.navigate("https://example.com").await.unwrap();

        let all_inputs = target.query_xpath(None, "//input").await.unwrap();
        assert_eq!(all_inputs.len(), 1);

        let by_attr = target
            .query_xpath(None, "//input[@id='search']")
            .await
            .unwrap();
        assert_eq!(by_attr.len(), 1);

        let by_text = target
            .query_xpath(None, "//a[text()='Docs']")
            .await
            .unwrap();
        assert_eq!(by_text.len(), 1);

        assert!(target.query_xpath(None, "a[@id='x']").await.is_err());
    }

    #[tokio::test]
    async fn click_records_and_follows_data_nav() {
        let target = seeded();
        target.register_page(
            "https://example.com/docs",
            StubPage::new("Docs").with_body_text("All the docs"),
        );
        {
            // retarget the link through the simulated navigation attribute
            let mut node = ElementNode::new("body>a:nth(0)", "a");
            node = node
                .with_text("Docs")
                .with_attribute("data-nav", "https://example.com/docs");
            target.register_page(
                "https://example.com",
                StubPage::new("Example").with_element(node),
            );
        }
        target.navigate("https://example.com").await.unwrap();
        let state = target.page_state().await.unwrap();
        let link = state.element(0).unwrap().clone();
        target.click_node(&link).await.unwrap();
        assert_eq!(target.clicks(), vec!["body>a:nth(0)".to_string()]);
        let page = target.current_page().await.unwrap();
        assert_eq!(page.url, "https://example.com/docs");
    }

    #[tokio::test]
    async fn input_text_rejects_non_editable_nodes() {
        let target = seeded();
        target.navigate("https://example.com").await.unwrap();
        let state = target.page_state().await.unwrap();
        let link = state.element(0).unwrap().clone();
        let field = state.element(1).unwrap().clone();

        assert!(matches!(
            target.input_text(&link, "hello").await.unwrap_err(),
            TargetError::NotInteractable(_)
        ));
        target.input_text(&field, "rust").await.unwrap();
        assert_eq!(target.inputs(), vec![("body>input:nth(1)".to_string(), "rust".to_string())]);
    }

    #[tokio::test]
    async fn tab_lifecycle() {
        let target = seeded();
        target.register_page("https://example.com/docs", StubPage::new("Docs"));
        target.navigate("https://example.com").await.unwrap();
        let second = target.open_tab("https://example.com/docs").await.unwrap();

        let tabs = target.all_tabs().await.unwrap();
        assert_eq!(tabs.len(), 2);
        assert!(tabs[1].active);

        let first = tabs[0].id.clone();
        target.switch_tab(&first).await.unwrap();
        assert_eq!(target.current_page().await.unwrap().url, "https://example.com");

        target.close_tab(&second).await.unwrap();
        let tabs = target.all_tabs().await.unwrap();
        assert_eq!(tabs.len(), 1);
        assert!(tabs[0].active);
    }

    #[tokio::test]
    async fn scrolling_clamps_to_bounds() {
        let target = seeded();
        target.navigate("https://example.com").await.unwrap();
        target.scroll_to_percent(140.0).await.unwrap();
        assert_eq!(target.scroll_position(), 100.0);
        target.scroll_page(PageDirection::Previous).await.unwrap();
        assert_eq!(target.scroll_position(), 10.0);
        assert!(target.scroll_to_text("Welcome").await.unwrap());
        assert!(!target.scroll_to_text("absent").await.unwrap());
    }
}
