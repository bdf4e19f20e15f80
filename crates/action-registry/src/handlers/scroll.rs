//! Scrolling handlers

use async_trait::async_trait;
use serde_json::{json, Value};

use target_adapter::PageDirection;

use crate::action::{parse_params, ActionCtx, ActionHandler};
use crate::errors::ActionError;
use crate::params::{EmptyParams, ScrollToPercentParams, ScrollToTextParams};
use crate::result::ActionResult;

pub struct ScrollToPercentHandler;

#[async_trait]
impl ActionHandler for ScrollToPercentHandler {
    async fn run(&self, ctx: &ActionCtx, params: Value) -> Result<ActionResult, ActionError> {
        let params: ScrollToPercentParams = parse_params("scroll_to_percent", params)?;
        if !(0.0..=100.0).contains(&params.percent) {
            return Err(ActionError::InvalidParams {
                action: "scroll_to_percent".to_string(),
                reason: format!("percent must be in [0, 100], got {}", params.percent),
            });
        }
        ctx.adapter.scroll_to_percent(params.percent).await?;
        Ok(ActionResult::ok(json!({ "percent": params.percent })))
    }
}

pub struct ScrollToTextHandler;

#[async_trait]
impl ActionHandler for ScrollToTextHandler {
    async fn run(&self, ctx: &ActionCtx, params: Value) -> Result<ActionResult, ActionError> {
        let params: ScrollToTextParams = parse_params("scroll_to_text", params)?;
        let found = ctx.adapter.scroll_to_text(&params.text).await?;
        if !found {
            return Err(ActionError::ElementNotFound(format!(
                "text not present on page: {}",
                params.text
            )));
        }
        Ok(ActionResult::ok(json!({ "text": params.text })))
    }
}

pub struct PreviousPageHandler;

#[async_trait]
impl ActionHandler for PreviousPageHandler {
    async fn run(&self, ctx: &ActionCtx, params: Value) -> Result<ActionResult, ActionError> {
        let _: EmptyParams = parse_params("previous_page", params)?;
        ctx.adapter.scroll_page(PageDirection::Previous).await?;
        Ok(ActionResult::ok_empty())
    }
}

pub struct NextPageHandler;

#[async_trait]
impl ActionHandler for NextPageHandler {
    async fn run(&self, ctx: &ActionCtx, params: Value) -> Result<ActionResult, ActionError> {
        let _: EmptyParams = parse_params("next_page", params)?;
        ctx.adapter.scroll_page(PageDirection::Next).await?;
        Ok(ActionResult::ok_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::handlers::tests_support::demo_ctx;

    #[tokio::test]
    async fn scroll_to_percent_validates_range() {
        let (ctx, target) = demo_ctx().await;
        ScrollToPercentHandler
            .run(&ctx, json!({"percent": 55.0}))
            .await
            .unwrap();
        assert_eq!(target.scroll_position(), 55.0);

        let err = ScrollToPercentHandler
            .run(&ctx, json!({"percent": 140.0}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParams);
    }

    #[tokio::test]
    async fn scroll_to_missing_text_is_element_not_found() {
        let (ctx, _target) = demo_ctx().await;
        ScrollToTextHandler
            .run(&ctx, json!({"text": "Welcome"}))
            .await
            .unwrap();

        let err = ScrollToTextHandler
            .run(&ctx, json!({"text": "no such text"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ElementNotFound);
    }

    #[tokio::test]
    async fn paging_moves_one_viewport() {
        let (ctx, target) = demo_ctx().await;
        NextPageHandler.run(&ctx, json!({})).await.unwrap();
        assert_eq!(target.scroll_position(), 90.0);
        PreviousPageHandler.run(&ctx, json!({})).await.unwrap();
        assert_eq!(target.scroll_position(), 0.0);
    }
}
