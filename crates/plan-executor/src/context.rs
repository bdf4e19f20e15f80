//! Context preconditions.
//!
//! Requirements are evaluated against an explicit snapshot captured from the
//! target immediately before an action runs; a failing required check aborts
//! that action before any side effect occurs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use element_resolver::{ElementResolver, Selector};
use target_adapter::{TargetAdapter, TargetError};

/// Opaque snapshot of the target state at validation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub url: String,
    pub title: String,
    pub tab_count: usize,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub captured_at: DateTime<Utc>,
}

impl ContextSnapshot {
    /// Capture the current target state.
    pub async fn capture(adapter: &dyn TargetAdapter) -> Result<Self, TargetError> {
        let page = adapter.current_page().await?;
        let tabs = adapter.all_tabs().await?;
        Ok(Self {
            url: page.url,
            title: page.title,
            tab_count: tabs.len(),
            captured_at: Utc::now(),
        })
    }
}

/// Typed precondition checks.
///
/// Recovery from the reference design's opaque validator closures: each
/// check is a named variant dispatched on directly, so requirements stay
/// serializable and testable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextCheck {
    UrlEquals(String),
    UrlContains(String),
    TitleContains(String),
    ElementExists(Selector),
    MinTabCount(usize),
}

/// One precondition attached to a scheduled action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextRequirement {
    pub check: ContextCheck,

    /// Required checks gate dispatch; optional ones only produce warnings.
    pub required: bool,

    pub description: String,
}

impl ContextRequirement {
    pub fn required(check: ContextCheck, description: impl Into<String>) -> Self {
        Self {
            check,
            required: true,
            description: description.into(),
        }
    }

    pub fn optional(check: ContextCheck, description: impl Into<String>) -> Self {
        Self {
            check,
            required: false,
            description: description.into(),
        }
    }
}

/// Outcome of evaluating a requirement list.
#[derive(Debug, Clone, Default)]
pub struct ContextReport {
    /// Required-check failure descriptions; non-empty means dispatch is
    /// aborted.
    pub failures: Vec<String>,

    /// Optional-check failure descriptions.
    pub warnings: Vec<String>,
}

impl ContextReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Evaluate every requirement against the snapshot.
pub async fn evaluate_requirements(
    requirements: &[ContextRequirement],
    snapshot: &ContextSnapshot,
    resolver: &ElementResolver,
) -> ContextReport {
    let mut report = ContextReport::default();
    for requirement in requirements {
        let satisfied = match &requirement.check {
            ContextCheck::UrlEquals(url) => snapshot.url == *url,
            ContextCheck::UrlContains(fragment) => snapshot.url.contains(fragment),
            ContextCheck::TitleContains(fragment) => snapshot.title.contains(fragment),
            ContextCheck::MinTabCount(min) => snapshot.tab_count >= *min,
            ContextCheck::ElementExists(selector) => resolver
                .find_best_element(selector, None)
                .await
                .ok()
                .flatten()
                .is_some(),
        };
        if satisfied {
            continue;
        }
        debug!(
            requirement = %requirement.description,
            required = requirement.required,
            "context check failed"
        );
        if requirement.required {
            report.failures.push(requirement.description.clone());
        } else {
            report.warnings.push(requirement.description.clone());
        }
    }
    report
}
