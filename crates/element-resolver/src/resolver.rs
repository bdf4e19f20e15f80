//! Resolution engine with ordered fallback chain and candidate scoring

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use target_adapter::TargetAdapter;

use crate::cache::ResolutionCache;
use crate::errors::ResolverError;
use crate::strategies::{
    AttributeStrategy, CssStrategy, ResolveStrategy, TextStrategy, VisualStrategy, XPathStrategy,
};
use crate::types::{ElementInfo, Selector, SelectorStrategy};

const DERIVED_CONFIDENCE_FACTOR: f64 = 0.8;

/// Resolves abstract selectors into concrete, scored elements.
pub struct ElementResolver {
    adapter: Arc<dyn TargetAdapter>,
    cache: ResolutionCache,
    css: CssStrategy,
    xpath: XPathStrategy,
    text: TextStrategy,
    attribute: AttributeStrategy,
    visual: VisualStrategy,
}

impl ElementResolver {
    pub fn new(adapter: Arc<dyn TargetAdapter>) -> Self {
        Self::with_cache_ttl(adapter, crate::cache::DEFAULT_TTL)
    }

    pub fn with_cache_ttl(adapter: Arc<dyn TargetAdapter>, ttl: Duration) -> Self {
        Self {
            adapter,
            cache: ResolutionCache::new(ttl),
            css: CssStrategy,
            xpath: XPathStrategy,
            text: TextStrategy,
            attribute: AttributeStrategy,
            visual: VisualStrategy,
        }
    }

    /// Drop all cached resolutions.
    pub fn invalidate_cache(&self) {
        self.cache.clear();
    }

    /// All candidates of the first strategy in the chain that matches.
    ///
    /// Results from a later, lower-confidence strategy are never merged with
    /// an earlier successful one. An empty result means "element not found",
    /// which callers surface as a retryable condition, not an error.
    pub async fn find_elements(
        &self,
        selector: &Selector,
        scope: Option<&str>,
    ) -> Result<Vec<ElementInfo>, ResolverError> {
        for candidate in self.strategy_chain(selector) {
            match self.evaluate_cached(&candidate, scope).await {
                Ok(elements) if !elements.is_empty() => {
                    debug!(
                        selector = %candidate.describe(),
                        count = elements.len(),
                        "strategy matched"
                    );
                    return Ok(elements);
                }
                Ok(_) => {
                    debug!(selector = %candidate.describe(), "strategy returned no candidates");
                }
                Err(err) => {
                    warn!(selector = %candidate.describe(), error = %err, "strategy failed");
                }
            }
        }
        Ok(Vec::new())
    }

    /// The best-scored candidate, or `None` when no strategy matches.
    pub async fn find_best_element(
        &self,
        selector: &Selector,
        scope: Option<&str>,
    ) -> Result<Option<ElementInfo>, ResolverError> {
        for candidate in self.strategy_chain(selector) {
            let elements = match self.evaluate_cached(&candidate, scope).await {
                Ok(elements) => elements,
                Err(err) => {
                    warn!(selector = %candidate.describe(), error = %err, "strategy failed");
                    continue;
                }
            };
            if elements.is_empty() {
                continue;
            }
            let best = pick_best(&candidate, elements);
            debug!(
                selector = %candidate.describe(),
                locator = %best.locator,
                "resolved best element"
            );
            return Ok(Some(best));
        }
        Ok(None)
    }

    /// Ordered strategy list: primary, explicit fallbacks, auto-derived
    /// fallbacks.
    fn strategy_chain(&self, selector: &Selector) -> Vec<Selector> {
        let mut chain = Vec::with_capacity(1 + selector.fallback_selectors.len());
        chain.push(Selector {
            fallback_selectors: Vec::new(),
            ..selector.clone()
        });
        for fallback in &selector.fallback_selectors {
            chain.push(Selector {
                fallback_selectors: Vec::new(),
                ..fallback.clone()
            });
        }
        chain.extend(derive_fallbacks(selector));
        chain
    }

    async fn evaluate_cached(
        &self,
        selector: &Selector,
        scope: Option<&str>,
    ) -> Result<Vec<ElementInfo>, ResolverError> {
        if let Some(hit) = self.cache.get(selector.strategy, &selector.pattern, scope) {
            debug!(selector = %selector.describe(), "cache hit");
            return Ok(hit);
        }
        let strategy = self.strategy_for(selector.strategy);
        let elements = strategy
            .evaluate(&selector.pattern, scope, self.adapter.as_ref())
            .await?;
        if !elements.is_empty() {
            self.cache
                .put(selector.strategy, &selector.pattern, scope, elements.clone());
        }
        Ok(elements)
    }

    fn strategy_for(&self, kind: SelectorStrategy) -> &dyn ResolveStrategy {
        match kind {
            SelectorStrategy::Css => &self.css,
            SelectorStrategy::XPath => &self.xpath,
            SelectorStrategy::Text => &self.text,
            SelectorStrategy::Attribute => &self.attribute,
            SelectorStrategy::Visual => &self.visual,
        }
    }
}

/// Score one candidate for the given (winning) selector.
///
/// Starts from the selector confidence, rewards visible/interactive
/// elements, rewards exact text equality for the text strategy, and
/// penalises hidden or inert elements. Clamped to [0, 1].
pub fn score_candidate(selector: &Selector, info: &ElementInfo) -> f64 {
    let mut score = selector.confidence;
    score += if info.visible { 0.3 } else { -0.5 };
    score += if info.interactive { 0.2 } else { -0.2 };
    if selector.strategy == SelectorStrategy::Text && info.text == selector.pattern {
        score += 0.4;
    }
    score.clamp(0.0, 1.0)
}

/// Highest-scored candidate; ties broken by first-seen order.
fn pick_best(selector: &Selector, mut elements: Vec<ElementInfo>) -> ElementInfo {
    let mut best_idx = 0;
    let mut best_score = f64::MIN;
    for (idx, info) in elements.iter().enumerate() {
        let score = score_candidate(selector, info);
        if score > best_score {
            best_score = score;
            best_idx = idx;
        }
    }
    // callers guarantee a non-empty candidate list
    elements.swap_remove(best_idx)
}

/// Auto-derive lower-confidence fallbacks from the primary selector.
///
/// A CSS selector embedding a text-equality predicate degrades to a pure
/// text search; an attribute-equality CSS or XPath selector degrades to the
/// attribute strategy.
fn derive_fallbacks(selector: &Selector) -> Vec<Selector> {
    let mut derived = Vec::new();
    let reduced = (selector.confidence * DERIVED_CONFIDENCE_FACTOR).clamp(0.0, 1.0);
    match selector.strategy {
        SelectorStrategy::Css => {
            if let Some(text) = extract_between(&selector.pattern, ":contains(", ")") {
                derived.push(Selector::text(text).with_confidence(reduced));
            }
            if let Some(body) = extract_between(&selector.pattern, "[", "]") {
                if let Some((name, value)) = body.split_once('=') {
                    derived.push(
                        Selector::attribute(
                            name.trim(),
                            value.trim().trim_matches(['"', '\''].as_ref()),
                        )
                        .with_confidence(reduced),
                    );
                }
            }
        }
        SelectorStrategy::XPath => {
            if let Some(body) = extract_between(&selector.pattern, "[@", "]") {
                if let Some((name, value)) = body.split_once('=') {
                    derived.push(
                        Selector::attribute(
                            name.trim(),
                            value.trim().trim_matches(['"', '\''].as_ref()),
                        )
                        .with_confidence(reduced),
                    );
                }
            }
            if let Some(text) = extract_between(&selector.pattern, "[text()=", "]") {
                derived.push(
                    Selector::text(text.trim_matches(['"', '\''].as_ref()))
                        .with_confidence(reduced),
                );
            }
        }
        _ => {}
    }
    derived
}

fn extract_between<'a>(pattern: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = pattern.find(open)? + open.len();
    let end = pattern[start..].find(close)? + start;
    let inner = pattern[start..end].trim_matches(['"', '\''].as_ref());
    if inner.is_empty() {
        None
    } else {
        Some(inner)
    }
}
