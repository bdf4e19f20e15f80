//! TTL cache for successful resolutions

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::types::{ElementInfo, SelectorStrategy};

pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// Value cache keyed by (strategy, pattern, scope identity).
///
/// Entries are a performance hint, never a correctness guarantee: the target
/// environment can mutate between calls, so expired entries are re-evaluated
/// and even live entries may describe elements that no longer exist.
pub struct ResolutionCache {
    entries: DashMap<String, (Vec<ElementInfo>, Instant)>,
    ttl: Duration,
}

impl ResolutionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn put(
        &self,
        strategy: SelectorStrategy,
        pattern: &str,
        scope: Option<&str>,
        elements: Vec<ElementInfo>,
    ) {
        self.entries
            .insert(key_for(strategy, pattern, scope), (elements, Instant::now()));
    }

    pub fn get(
        &self,
        strategy: SelectorStrategy,
        pattern: &str,
        scope: Option<&str>,
    ) -> Option<Vec<ElementInfo>> {
        let key = key_for(strategy, pattern, scope);
        if let Some(entry) = self.entries.get(&key) {
            if entry.1.elapsed() <= self.ttl {
                return Some(entry.0.clone());
            }
        }
        self.entries.remove(&key);
        None
    }

    /// Drop every entry recorded under the given scope identity.
    pub fn invalidate_scope(&self, scope: Option<&str>) {
        let prefix = format!("{}|", scope.unwrap_or(""));
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(&prefix))
            .map(|entry| entry.key().clone())
            .collect();
        for key in keys {
            self.entries.remove(&key);
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

fn key_for(strategy: SelectorStrategy, pattern: &str, scope: Option<&str>) -> String {
    format!("{}|{}|{}", scope.unwrap_or(""), strategy.name(), pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(locator: &str) -> ElementInfo {
        ElementInfo {
            locator: locator.to_string(),
            index: None,
            tag: "div".to_string(),
            text: String::new(),
            visible: true,
            interactive: false,
            attributes: Default::default(),
            bbox: Default::default(),
        }
    }

    #[test]
    fn hit_within_ttl_miss_after_expiry() {
        let cache = ResolutionCache::new(Duration::from_millis(40));
        cache.put(SelectorStrategy::Css, "#a", None, vec![info("p1")]);

        let hit = cache.get(SelectorStrategy::Css, "#a", None);
        assert_eq!(hit.unwrap().len(), 1);

        std::thread::sleep(Duration::from_millis(60));
        assert!(cache.get(SelectorStrategy::Css, "#a", None).is_none());
        // expired entry was evicted on read
        assert!(cache.is_empty());
    }

    #[test]
    fn scope_is_part_of_the_key() {
        let cache = ResolutionCache::default();
        cache.put(SelectorStrategy::Css, "#a", Some("form"), vec![info("p1")]);
        assert!(cache.get(SelectorStrategy::Css, "#a", None).is_none());
        assert!(cache.get(SelectorStrategy::Css, "#a", Some("form")).is_some());
    }

    #[test]
    fn invalidate_scope_only_drops_that_scope() {
        let cache = ResolutionCache::default();
        cache.put(SelectorStrategy::Css, "#a", Some("form"), vec![info("p1")]);
        cache.put(SelectorStrategy::Css, "#a", None, vec![info("p2")]);
        cache.invalidate_scope(Some("form"));
        assert!(cache.get(SelectorStrategy::Css, "#a", Some("form")).is_none());
        assert!(cache.get(SelectorStrategy::Css, "#a", None).is_some());
    }
}
