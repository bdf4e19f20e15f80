//! Append-only, name-unique action catalogue

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use schemars::schema::RootSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::action::Action;
use crate::errors::RegistryError;

/// Advertisement entry describing one action to the upstream planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub description: String,
    pub has_target_index: bool,
    pub params_schema: RootSchema,
}

/// The action catalogue.
///
/// Registration is append-only: binding a name twice is a loud error, never
/// a silent replacement, so planner-visible capabilities cannot drift.
#[derive(Default)]
pub struct ActionRegistry {
    actions: RwLock<BTreeMap<String, Arc<Action>>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, action: Action) -> Result<(), RegistryError> {
        let mut actions = self.actions.write();
        if actions.contains_key(&action.name) {
            return Err(RegistryError::DuplicateAction(action.name));
        }
        debug!(action = %action.name, "registered action");
        actions.insert(action.name.clone(), Arc::new(action));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<Action>, RegistryError> {
        self.actions
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownAction(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.read().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.actions.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.actions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.read().is_empty()
    }

    /// Capability advertisement for the upstream planner: name to
    /// description/schema, used verbatim to describe intent.
    pub fn describe(&self) -> BTreeMap<String, ActionDescriptor> {
        self.actions
            .read()
            .iter()
            .map(|(name, action)| {
                (
                    name.clone(),
                    ActionDescriptor {
                        description: action.description.clone(),
                        has_target_index: action.has_target_index,
                        params_schema: action.params_schema.clone(),
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionCtx, ActionHandler};
    use crate::errors::ActionError;
    use crate::result::ActionResult;
    use async_trait::async_trait;
    use schemars::JsonSchema;
    use serde::Deserialize;
    use serde_json::Value;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct NoParams {}

    struct Noop;

    #[async_trait]
    impl ActionHandler for Noop {
        async fn run(&self, _ctx: &ActionCtx, _params: Value) -> Result<ActionResult, ActionError> {
            Ok(ActionResult::ok_empty())
        }
    }

    fn demo_action(name: &str) -> Action {
        Action::new::<NoParams>(name, format!("{name} description"), Arc::new(Noop))
    }

    #[test]
    fn register_and_get() {
        let registry = ActionRegistry::new();
        registry.register(demo_action("wait")).unwrap();
        assert!(registry.contains("wait"));
        assert_eq!(registry.get("wait").unwrap().name, "wait");
    }

    #[test]
    fn unknown_name_is_a_lookup_miss() {
        let registry = ActionRegistry::new();
        let err = registry.get("missing").unwrap_err();
        assert!(matches!(err, RegistryError::UnknownAction(_)));
    }

    #[test]
    fn duplicate_registration_fails_loudly() {
        let registry = ActionRegistry::new();
        registry.register(demo_action("wait")).unwrap();
        let err = registry.register(demo_action("wait")).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateAction(_)));
        // the first registration stays
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("wait").unwrap().description, "wait description");
    }

    #[test]
    fn describe_lists_every_action() {
        let registry = ActionRegistry::new();
        registry.register(demo_action("wait")).unwrap();
        registry
            .register(demo_action("extract_content"))
            .unwrap();
        let advertised = registry.describe();
        assert_eq!(advertised.len(), 2);
        assert!(advertised.contains_key("wait"));
        assert_eq!(
            advertised["extract_content"].description,
            "extract_content description"
        );
    }
}
