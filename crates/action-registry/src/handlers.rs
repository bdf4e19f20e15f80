//! Built-in action handlers.
//!
//! One module per operation family, mirroring the capability set of the
//! target adapter. `register_builtin` wires all of them into a registry.

pub mod content;
pub mod interact;
pub mod navigate;
pub mod scroll;
pub mod tabs;

use std::sync::Arc;

use crate::action::Action;
use crate::errors::RegistryError;
use crate::params::*;
use crate::registry::ActionRegistry;

/// Register the full built-in action set.
pub fn register_builtin(registry: &ActionRegistry) -> Result<(), RegistryError> {
    registry.register(Action::new::<NavigateParams>(
        "navigate_to",
        "Navigate the active tab to a URL",
        Arc::new(navigate::NavigateHandler),
    ))?;
    registry.register(Action::new::<OpenTabParams>(
        "open_tab",
        "Open a new tab at a URL and focus it",
        Arc::new(tabs::OpenTabHandler),
    ))?;
    registry.register(Action::new::<SwitchTabParams>(
        "switch_tab",
        "Focus an existing tab by id",
        Arc::new(tabs::SwitchTabHandler),
    ))?;
    registry.register(Action::new::<CloseTabParams>(
        "close_tab",
        "Close a tab by id",
        Arc::new(tabs::CloseTabHandler),
    ))?;
    registry.register(Action::new::<EmptyParams>(
        "list_tabs",
        "List all open tabs",
        Arc::new(tabs::ListTabsHandler),
    ))?;
    registry.register(
        Action::new::<ClickParams>(
            "click_element",
            "Click the element at an interactive index",
            Arc::new(interact::ClickHandler),
        )
        .with_target_index(),
    )?;
    registry.register(
        Action::new::<InputTextParams>(
            "input_text",
            "Type text into the form control at an interactive index",
            Arc::new(interact::InputTextHandler),
        )
        .with_target_index(),
    )?;
    registry.register(Action::new::<SendKeysParams>(
        "send_keys",
        "Send raw key chords to the focused page",
        Arc::new(interact::SendKeysHandler),
    ))?;
    registry.register(Action::new::<ScrollToPercentParams>(
        "scroll_to_percent",
        "Scroll to a vertical position expressed as a percentage",
        Arc::new(scroll::ScrollToPercentHandler),
    ))?;
    registry.register(Action::new::<ScrollToTextParams>(
        "scroll_to_text",
        "Scroll until the given text is visible",
        Arc::new(scroll::ScrollToTextHandler),
    ))?;
    registry.register(Action::new::<EmptyParams>(
        "previous_page",
        "Scroll one viewport backwards",
        Arc::new(scroll::PreviousPageHandler),
    ))?;
    registry.register(Action::new::<EmptyParams>(
        "next_page",
        "Scroll one viewport forwards",
        Arc::new(scroll::NextPageHandler),
    ))?;
    registry.register(
        Action::new::<DropdownOptionsParams>(
            "get_dropdown_options",
            "Read the options of the dropdown at an interactive index",
            Arc::new(interact::DropdownOptionsHandler),
        )
        .with_target_index(),
    )?;
    registry.register(
        Action::new::<SelectDropdownParams>(
            "select_dropdown_option",
            "Select a dropdown option by value at an interactive index",
            Arc::new(interact::SelectDropdownHandler),
        )
        .with_target_index(),
    )?;
    registry.register(Action::new::<EmptyParams>(
        "extract_content",
        "Extract the readable content of the focused page",
        Arc::new(content::ExtractContentHandler),
    ))?;
    registry.register(Action::new::<FindElementParams>(
        "find_element",
        "Resolve a selector to its best-scored element",
        Arc::new(content::FindElementHandler),
    ))?;
    registry.register(Action::new::<WaitParams>(
        "wait",
        "Wait for a fixed duration",
        Arc::new(content::WaitHandler),
    ))?;
    Ok(())
}

/// A registry pre-populated with the built-in action set.
pub fn builtin_registry() -> Result<ActionRegistry, RegistryError> {
    let registry = ActionRegistry::new();
    register_builtin(&registry)?;
    Ok(registry)
}

#[cfg(test)]
pub(crate) mod tests_support {
    use std::sync::Arc;

    use element_resolver::ElementResolver;
    use target_adapter::{
        BoundingBox, DropdownOption, ElementNode, StubPage, StubTarget, TargetAdapter,
    };

    use crate::action::ActionCtx;

    /// A context over a seeded stub target: a home page with a button, a
    /// search field and a language dropdown, plus a login page.
    pub async fn demo_ctx() -> (ActionCtx, Arc<StubTarget>) {
        let target = StubTarget::shared();
        target.register_page(
            "https://demo.test",
            StubPage::new("Home")
                .with_element(
                    ElementNode::new("body>button:nth(0)", "button")
                        .with_text("Continue")
                        .with_bbox(BoundingBox::new(0.0, 0.0, 100.0, 30.0)),
                )
                .with_element(
                    ElementNode::new("body>input:nth(1)", "input")
                        .with_attribute("id", "q")
                        .with_bbox(BoundingBox::new(0.0, 40.0, 200.0, 24.0)),
                )
                .with_element(
                    ElementNode::new("body>select:nth(2)", "select")
                        .with_attribute("id", "lang")
                        .with_bbox(BoundingBox::new(0.0, 80.0, 120.0, 24.0)),
                )
                .with_dropdown(
                    "body>select:nth(2)",
                    vec![
                        DropdownOption {
                            value: "en".to_string(),
                            label: "English".to_string(),
                            selected: true,
                        },
                        DropdownOption {
                            value: "fr".to_string(),
                            label: "French".to_string(),
                            selected: false,
                        },
                    ],
                )
                .with_body_text("Welcome home"),
        );
        target.register_page("https://demo.test/login", StubPage::new("Login"));
        target.navigate("https://demo.test").await.unwrap();

        let resolver = Arc::new(ElementResolver::new(target.clone()));
        let ctx = ActionCtx::new(target.clone(), resolver);
        (ctx, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_set_is_name_unique_and_complete() {
        let registry = builtin_registry().unwrap();
        assert_eq!(registry.len(), 17);
        for name in [
            "navigate_to",
            "open_tab",
            "switch_tab",
            "close_tab",
            "list_tabs",
            "click_element",
            "input_text",
            "send_keys",
            "scroll_to_percent",
            "scroll_to_text",
            "previous_page",
            "next_page",
            "get_dropdown_options",
            "select_dropdown_option",
            "extract_content",
            "find_element",
            "wait",
        ] {
            assert!(registry.contains(name), "missing builtin: {name}");
        }
    }

    #[test]
    fn target_index_flags() {
        let registry = builtin_registry().unwrap();
        assert!(registry.get("click_element").unwrap().has_target_index);
        assert!(registry.get("input_text").unwrap().has_target_index);
        assert!(registry.get("select_dropdown_option").unwrap().has_target_index);
        assert!(!registry.get("navigate_to").unwrap().has_target_index);
        assert!(!registry.get("send_keys").unwrap().has_target_index);
    }
}
