//! Action definition and execution context

use std::sync::Arc;

use async_trait::async_trait;
use schemars::{gen::SchemaGenerator, schema::RootSchema, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;

use element_resolver::{ElementInfo, ElementResolver, Selector};
use target_adapter::{ElementNode, TargetAdapter};

use crate::errors::ActionError;
use crate::result::ActionResult;

/// Execution context handed to action handlers.
///
/// Handlers may read the context during one invocation but never retain it.
#[derive(Clone)]
pub struct ActionCtx {
    pub adapter: Arc<dyn TargetAdapter>,
    pub resolver: Arc<ElementResolver>,
}

impl ActionCtx {
    pub fn new(adapter: Arc<dyn TargetAdapter>, resolver: Arc<ElementResolver>) -> Self {
        Self { adapter, resolver }
    }

    /// Look up an element by its interactive index in the current page map.
    pub async fn node_at(&self, index: usize) -> Result<ElementNode, ActionError> {
        let state = self.adapter.cached_state().await?;
        state
            .element(index)
            .cloned()
            .ok_or_else(|| ActionError::ElementNotFound(format!("no element at index {index}")))
    }

    /// Resolve a selector to its best-scored element.
    pub async fn resolve(&self, selector: &Selector) -> Result<Option<ElementInfo>, ActionError> {
        Ok(self.resolver.find_best_element(selector, None).await?)
    }
}

/// Handler invoked with schema-validated parameters.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn run(&self, ctx: &ActionCtx, params: Value) -> Result<ActionResult, ActionError>;
}

/// A named, schema-described operation.
///
/// Immutable after registration.
pub struct Action {
    pub name: String,
    pub description: String,
    pub params_schema: RootSchema,
    pub has_target_index: bool,
    handler: Arc<dyn ActionHandler>,
}

impl Action {
    /// Define an action whose parameters deserialize into `P`.
    pub fn new<P: JsonSchema>(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: Arc<dyn ActionHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params_schema: SchemaGenerator::default().into_root_schema_for::<P>(),
            has_target_index: false,
            handler,
        }
    }

    /// Mark this action as addressing a target element by index.
    pub fn with_target_index(mut self) -> Self {
        self.has_target_index = true;
        self
    }

    /// Dispatch to the handler.
    pub async fn invoke(&self, ctx: &ActionCtx, params: Value) -> Result<ActionResult, ActionError> {
        self.handler.run(ctx, params).await
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("has_target_index", &self.has_target_index)
            .finish()
    }
}

/// Deserialize raw parameters into the action's typed struct.
pub fn parse_params<T: DeserializeOwned>(action: &str, params: Value) -> Result<T, ActionError> {
    serde_json::from_value(params).map_err(|err| ActionError::InvalidParams {
        action: action.to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct DemoParams {
        url: String,
    }

    #[test]
    fn parse_params_reports_schema_mismatch() {
        let parsed: Result<DemoParams, _> =
            parse_params("navigate_to", serde_json::json!({"url": "https://example.com"}));
        assert_eq!(parsed.unwrap().url, "https://example.com");

        let bad: Result<DemoParams, _> = parse_params("navigate_to", serde_json::json!({}));
        let err = bad.unwrap_err();
        assert!(matches!(err, ActionError::InvalidParams { .. }));
    }

    #[test]
    fn schema_is_generated_from_the_param_type() {
        struct Noop;
        #[async_trait]
        impl ActionHandler for Noop {
            async fn run(&self, _ctx: &ActionCtx, _params: Value) -> Result<ActionResult, ActionError> {
                Ok(ActionResult::ok_empty())
            }
        }

        let action = Action::new::<DemoParams>("navigate_to", "Navigate somewhere", Arc::new(Noop));
        let schema = serde_json::to_value(&action.params_schema).unwrap();
        assert!(schema["properties"]["url"].is_object());
        assert!(!action.has_target_index);
    }
}
