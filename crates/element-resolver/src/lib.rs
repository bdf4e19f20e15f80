//! Multi-strategy element resolution.
//!
//! Turns an abstract selector (strategy + pattern + optional fallbacks) into
//! concrete, scored elements. Strategies are tried strictly in order; the
//! first one returning candidates wins and later, lower-confidence strategies
//! are never merged in. Successful lookups are cached by
//! (strategy, pattern, scope) for a fixed TTL; cache entries are values, not
//! live handles, so staleness is tolerated by callers.

pub mod cache;
pub mod errors;
pub mod resolver;
pub mod strategies;
pub mod types;

pub use cache::ResolutionCache;
pub use errors::ResolverError;
pub use resolver::ElementResolver;
pub use types::{ElementInfo, Selector, SelectorStrategy};
