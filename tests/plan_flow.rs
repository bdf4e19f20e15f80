//! End-to-end plan execution over the demo target.

use pagepilot_cli::demo::{demo_target, RESULTS_URL, SEARCH_URL};
use pagepilot_cli::{build_engine, EngineConfig};

use pagepilot_event_bus::{EventBus, Lifecycle};
use plan_executor::{EnhancedAction, ExecutionPlan};
use serde_json::json;

fn search_flow_plan() -> ExecutionPlan {
    ExecutionPlan::new("search-flow")
        .with_action(
            EnhancedAction::new("open-search", "navigate_to")
                .with_params(json!({"url": SEARCH_URL})),
        )
        .with_action(
            EnhancedAction::new("type-query", "input_text")
                .with_params(json!({"index": 0, "text": "pagepilot"}))
                .with_dependency("open-search"),
        )
        .with_action(
            EnhancedAction::new("submit", "click_element")
                .with_params(json!({"index": 1}))
                .with_dependency("type-query"),
        )
        .with_action(EnhancedAction::new("read-results", "extract_content").with_dependency("submit"))
}

#[tokio::test]
async fn search_flow_runs_in_order_and_extracts_results() {
    let target = demo_target();
    let engine = build_engine(target.clone(), &EngineConfig::default()).unwrap();
    let mut events = engine.bus.subscribe();

    let report = engine.executor.execute_plan(&search_flow_plan()).await.unwrap();

    assert!(report.success, "plan failed: {:?}", report.results);
    assert_eq!(
        report.executed,
        vec!["open-search", "type-query", "submit", "read-results"]
    );
    assert!(report.skipped.is_empty());

    // the click on the submit button routed to the results page
    let extracted = report
        .results
        .iter()
        .find(|entry| entry.action_id == "read-results")
        .unwrap();
    let data = extracted.result.data.as_ref().unwrap();
    assert_eq!(data["url"], RESULTS_URL);
    assert!(data["text"].as_str().unwrap().contains("2 results found"));

    // the typed text landed in the search field
    assert_eq!(
        target.inputs(),
        vec![("body>form>input:nth(0)".to_string(), "pagepilot".to_string())]
    );

    // one start and one terminal event per executed action
    let mut starts = 0;
    let mut terminals = 0;
    while let Ok(event) = events.try_recv() {
        match event.state {
            Lifecycle::Start => starts += 1,
            Lifecycle::Ok | Lifecycle::Fail => terminals += 1,
        }
    }
    assert_eq!(starts, 4);
    assert_eq!(terminals, 4);
}

#[tokio::test]
async fn failed_navigation_is_recovered_by_its_fallback() {
    let engine = build_engine(demo_target(), &EngineConfig::default()).unwrap();

    let plan = ExecutionPlan::new("fallback-flow")
        .with_action(
            EnhancedAction::new("nav-bad", "navigate_to")
                .with_params(json!({"url": "https://nowhere.invalid"}))
                .with_max_retries(1)
                .with_fallback("nav-good"),
        )
        .with_action(
            EnhancedAction::new("nav-good", "navigate_to")
                .with_params(json!({"url": RESULTS_URL})),
        )
        .with_action(EnhancedAction::new("read", "extract_content").with_dependency("nav-good"));

    let report = engine.executor.execute_plan(&plan).await.unwrap();

    assert!(report.success);
    assert_eq!(report.recovered, vec!["nav-bad"]);
    let fallback_entry = report
        .results
        .iter()
        .find(|entry| entry.fallback_for.as_deref() == Some("nav-bad"))
        .unwrap();
    assert_eq!(fallback_entry.action_id, "nav-good");
    assert!(fallback_entry.result.success);

    // the fallback counts as executed, so its dependent ran too
    assert!(report.executed.contains(&"read".to_string()));
}

#[tokio::test]
async fn plan_files_round_trip_through_json() {
    let plan = search_flow_plan();
    let text = serde_json::to_string_pretty(&plan).unwrap();
    let back: ExecutionPlan = serde_json::from_str(&text).unwrap();
    assert_eq!(back.actions.len(), 4);
    assert_eq!(back.actions[1].dependencies, vec!["open-search"]);
}
