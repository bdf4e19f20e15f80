//! A small simulated site for the CLI and integration tests.

use std::sync::Arc;

use target_adapter::{BoundingBox, DropdownOption, ElementNode, StubPage, StubTarget};

pub const HOME_URL: &str = "https://demo.pagepilot.dev";
pub const SEARCH_URL: &str = "https://demo.pagepilot.dev/search";
pub const RESULTS_URL: &str = "https://demo.pagepilot.dev/results";

/// Build the demo target: home -> search -> results, with a form and a
/// language dropdown on the search page.
pub fn demo_target() -> Arc<StubTarget> {
    let target = StubTarget::shared();

    target.register_page(
        HOME_URL,
        StubPage::new("PagePilot Demo")
            .with_element(
                ElementNode::new("body>nav>a:nth(0)", "a")
                    .with_text("Search")
                    .with_attribute("href", "/search")
                    .with_attribute("data-nav", SEARCH_URL)
                    .with_bbox(BoundingBox::new(10.0, 10.0, 80.0, 24.0)),
            )
            .with_element(
                ElementNode::new("body>nav>a:nth(1)", "a")
                    .with_text("About")
                    .with_attribute("href", "/about")
                    .with_bbox(BoundingBox::new(100.0, 10.0, 80.0, 24.0)),
            )
            .with_body_text("Welcome to the PagePilot demo site"),
    );

    target.register_page(
        SEARCH_URL,
        StubPage::new("Search")
            .with_element(
                ElementNode::new("body>form>input:nth(0)", "input")
                    .with_attribute("id", "query")
                    .with_attribute("name", "q")
                    .with_bbox(BoundingBox::new(10.0, 50.0, 240.0, 28.0)),
            )
            .with_element(
                ElementNode::new("body>form>button:nth(1)", "button")
                    .with_text("Go")
                    .with_attribute("data-nav", RESULTS_URL)
                    .with_bbox(BoundingBox::new(260.0, 50.0, 60.0, 28.0)),
            )
            .with_element(
                ElementNode::new("body>form>select:nth(2)", "select")
                    .with_attribute("id", "lang")
                    .with_bbox(BoundingBox::new(10.0, 90.0, 120.0, 28.0)),
            )
            .with_dropdown(
                "body>form>select:nth(2)",
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
            .with_body_text("Search the demo corpus"),
    );

    target.register_page(
        RESULTS_URL,
        StubPage::new("Results")
            .with_element(
                ElementNode::new("body>ul>a:nth(0)", "a")
                    .with_text("Result One")
                    .with_bbox(BoundingBox::new(10.0, 40.0, 200.0, 20.0)),
            )
            .with_element(
                ElementNode::new("body>ul>a:nth(1)", "a")
                    .with_text("Result Two")
                    .with_bbox(BoundingBox::new(10.0, 70.0, 200.0, 20.0)),
            )
            .with_body_text("2 results found"),
    );

    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use target_adapter::TargetAdapter;

    #[tokio::test]
    async fn demo_site_is_navigable() {
        let target = demo_target();
        target.navigate(HOME_URL).await.unwrap();
        let state = target.page_state().await.unwrap();
        assert_eq!(state.title, "PagePilot Demo");
        assert_eq!(state.len(), 2);

        // the nav link routes to the search page
        let link = state.element(0).unwrap().clone();
        target.click_node(&link).await.unwrap();
        assert_eq!(target.current_page().await.unwrap().url, SEARCH_URL);
    }
}
