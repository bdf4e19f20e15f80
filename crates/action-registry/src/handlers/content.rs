//! Content extraction, selector resolution and waiting

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::time::{sleep, Duration};

use element_resolver::Selector;

use crate::action::{parse_params, ActionCtx, ActionHandler};
use crate::errors::ActionError;
use crate::params::{EmptyParams, FindElementParams, WaitParams};
use crate::result::ActionResult;

pub struct ExtractContentHandler;

#[async_trait]
impl ActionHandler for ExtractContentHandler {
    async fn run(&self, ctx: &ActionCtx, params: Value) -> Result<ActionResult, ActionError> {
        let _: EmptyParams = parse_params("extract_content", params)?;
        let page = ctx.adapter.current_page().await?;
        let text = ctx.adapter.extract_text().await?;
        Ok(ActionResult::ok(json!({
            "url": page.url,
            "title": page.title,
            "text": text,
        })))
    }
}

pub struct FindElementHandler;

#[async_trait]
impl ActionHandler for FindElementHandler {
    async fn run(&self, ctx: &ActionCtx, params: Value) -> Result<ActionResult, ActionError> {
        let params: FindElementParams = parse_params("find_element", params)?;
        let selector = Selector::new(params.strategy, params.pattern.clone())
            .with_confidence(params.confidence);
        match ctx.resolve(&selector).await? {
            Some(element) => Ok(ActionResult::ok(json!({ "element": element }))),
            None => Err(ActionError::ElementNotFound(selector.describe())),
        }
    }
}

pub struct WaitHandler;

#[async_trait]
impl ActionHandler for WaitHandler {
    async fn run(&self, _ctx: &ActionCtx, params: Value) -> Result<ActionResult, ActionError> {
        let params: WaitParams = parse_params("wait", params)?;
        sleep(Duration::from_millis(params.duration_ms)).await;
        Ok(ActionResult::ok(json!({ "waited_ms": params.duration_ms })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::handlers::tests_support::demo_ctx;

    #[tokio::test]
    async fn extract_content_reads_the_page() {
        let (ctx, _target) = demo_ctx().await;
        let result = ExtractContentHandler.run(&ctx, json!({})).await.unwrap();
        let data = result.data.unwrap();
        assert_eq!(data["title"], "Home");
        assert!(data["text"].as_str().unwrap().contains("Welcome home"));
    }

    #[tokio::test]
    async fn find_element_resolves_text_selector() {
        let (ctx, _target) = demo_ctx().await;
        let result = FindElementHandler
            .run(&ctx, json!({"strategy": "text", "pattern": "Continue"}))
            .await
            .unwrap();
        let element = result.data.unwrap()["element"].clone();
        assert_eq!(element["tag"], "button");

        let err = FindElementHandler
            .run(&ctx, json!({"strategy": "text", "pattern": "Nonexistent"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ElementNotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_sleeps_for_the_requested_duration() {
        let (ctx, _target) = demo_ctx().await;
        let started = tokio::time::Instant::now();
        let result = WaitHandler
            .run(&ctx, json!({"duration_ms": 250}))
            .await
            .unwrap();
        assert!(result.success);
        assert!(started.elapsed() >= Duration::from_millis(250));
    }
}
