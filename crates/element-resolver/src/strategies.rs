//! Per-strategy evaluation against the target

use async_trait::async_trait;
use tracing::debug;

use target_adapter::TargetAdapter;

use crate::errors::ResolverError;
use crate::types::{ElementInfo, SelectorStrategy};

/// One way of evaluating a pattern against the live target.
#[async_trait]
pub trait ResolveStrategy: Send + Sync {
    fn kind(&self) -> SelectorStrategy;

    async fn evaluate(
        &self,
        pattern: &str,
        scope: Option<&str>,
        adapter: &dyn TargetAdapter,
    ) -> Result<Vec<ElementInfo>, ResolverError>;
}

/// CSS selector evaluation, delegated to the target.
pub struct CssStrategy;

#[async_trait]
impl ResolveStrategy for CssStrategy {
    fn kind(&self) -> SelectorStrategy {
        SelectorStrategy::Css
    }

    async fn evaluate(
        &self,
        pattern: &str,
        scope: Option<&str>,
        adapter: &dyn TargetAdapter,
    ) -> Result<Vec<ElementInfo>, ResolverError> {
        let nodes = adapter.query_css(scope, pattern).await?;
        Ok(nodes.iter().map(ElementInfo::from_node).collect())
    }
}

/// XPath evaluation, delegated to the target.
pub struct XPathStrategy;

#[async_trait]
impl ResolveStrategy for XPathStrategy {
    fn kind(&self) -> SelectorStrategy {
        SelectorStrategy::XPath
    }

    async fn evaluate(
        &self,
        pattern: &str,
        scope: Option<&str>,
        adapter: &dyn TargetAdapter,
    ) -> Result<Vec<ElementInfo>, ResolverError> {
        let nodes = adapter.query_xpath(scope, pattern).await?;
        Ok(nodes.iter().map(ElementInfo::from_node).collect())
    }
}

/// Substring text search over the page element map.
pub struct TextStrategy;

#[async_trait]
impl ResolveStrategy for TextStrategy {
    fn kind(&self) -> SelectorStrategy {
        SelectorStrategy::Text
    }

    async fn evaluate(
        &self,
        pattern: &str,
        scope: Option<&str>,
        adapter: &dyn TargetAdapter,
    ) -> Result<Vec<ElementInfo>, ResolverError> {
        let state = adapter.page_state().await?;
        Ok(state
            .elements
            .values()
            .filter(|node| in_scope(&node.locator, scope) && node.text.contains(pattern))
            .map(ElementInfo::from_node)
            .collect())
    }
}

/// `name=value` attribute-equality search over the page element map.
pub struct AttributeStrategy;

#[async_trait]
impl ResolveStrategy for AttributeStrategy {
    fn kind(&self) -> SelectorStrategy {
        SelectorStrategy::Attribute
    }

    async fn evaluate(
        &self,
        pattern: &str,
        scope: Option<&str>,
        adapter: &dyn TargetAdapter,
    ) -> Result<Vec<ElementInfo>, ResolverError> {
        let (name, value) = pattern
            .split_once('=')
            .ok_or_else(|| ResolverError::InvalidPattern {
                strategy: "attribute",
                pattern: pattern.to_string(),
            })?;
        let state = adapter.page_state().await?;
        Ok(state
            .elements
            .values()
            .filter(|node| {
                in_scope(&node.locator, scope) && node.attribute(name.trim()) == Some(value.trim())
            })
            .map(ElementInfo::from_node)
            .collect())
    }
}

/// Page-coordinate point search: pattern "x,y" matches elements whose layout
/// box contains the point.
pub struct VisualStrategy;

#[async_trait]
impl ResolveStrategy for VisualStrategy {
    fn kind(&self) -> SelectorStrategy {
        SelectorStrategy::Visual
    }

    async fn evaluate(
        &self,
        pattern: &str,
        scope: Option<&str>,
        adapter: &dyn TargetAdapter,
    ) -> Result<Vec<ElementInfo>, ResolverError> {
        let (x, y) = parse_point(pattern)?;
        let state = adapter.page_state().await?;
        let matched: Vec<ElementInfo> = state
            .elements
            .values()
            .filter(|node| in_scope(&node.locator, scope) && node.bbox.contains(x, y))
            .map(ElementInfo::from_node)
            .collect();
        debug!(pattern, count = matched.len(), "visual strategy evaluated");
        Ok(matched)
    }
}

fn in_scope(locator: &str, scope: Option<&str>) -> bool {
    match scope {
        Some(prefix) => locator.starts_with(prefix),
        None => true,
    }
}

fn parse_point(pattern: &str) -> Result<(f64, f64), ResolverError> {
    let invalid = || ResolverError::InvalidPattern {
        strategy: "visual",
        pattern: pattern.to_string(),
    };
    let (x, y) = pattern.split_once(',').ok_or_else(invalid)?;
    let x = x.trim().parse::<f64>().map_err(|_| invalid())?;
    let y = y.trim().parse::<f64>().map_err(|_| invalid())?;
    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use target_adapter::{BoundingBox, ElementNode, StubPage, StubTarget};

    async fn seeded() -> StubTarget {
        let target = StubTarget::new();
        target.register_page(
            "https://example.com",
            StubPage::new("Example")
                .with_element(
                    ElementNode::new("body>button:nth(0)", "button")
                        .with_text("Submit order")
                        .with_attribute("data-test", "submit")
                        .with_bbox(BoundingBox::new(10.0, 10.0, 100.0, 30.0)),
                )
                .with_element(
                    ElementNode::new("body>span:nth(1)", "span")
                        .with_text("Order summary")
                        .with_bbox(BoundingBox::new(10.0, 60.0, 100.0, 15.0)),
                ),
        );
        target.navigate("https://example.com").await.unwrap();
        target
    }

    #[tokio::test]
    async fn text_strategy_matches_substrings() {
        let target = seeded().await;
        let found = TextStrategy.evaluate("Order", None, &target).await.unwrap();
        assert_eq!(found.len(), 2);
        let found = TextStrategy.evaluate("Submit", None, &target).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].tag, "button");
    }

    #[tokio::test]
    async fn attribute_strategy_requires_name_value_pattern() {
        let target = seeded().await;
        let found = AttributeStrategy
            .evaluate("data-test=submit", None, &target)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let err = AttributeStrategy
            .evaluate("data-test", None, &target)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolverError::InvalidPattern { .. }));
    }

    #[tokio::test]
    async fn visual_strategy_matches_containing_boxes() {
        let target = seeded().await;
        let found = VisualStrategy.evaluate("15,20", None, &target).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].tag, "button");

        let none = VisualStrategy
            .evaluate("500,500", None, &target)
            .await
            .unwrap();
        assert!(none.is_empty());

        assert!(VisualStrategy.evaluate("abc", None, &target).await.is_err());
    }
}
