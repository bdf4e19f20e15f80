//! Navigation handler

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use crate::action::{parse_params, ActionCtx, ActionHandler};
use crate::errors::ActionError;
use crate::params::NavigateParams;
use crate::result::ActionResult;

pub struct NavigateHandler;

#[async_trait]
impl ActionHandler for NavigateHandler {
    async fn run(&self, ctx: &ActionCtx, params: Value) -> Result<ActionResult, ActionError> {
        let params: NavigateParams = parse_params("navigate_to", params)?;
        info!(url = %params.url, "navigating");
        ctx.adapter.navigate(&params.url).await?;
        let page = ctx.adapter.current_page().await?;
        Ok(ActionResult::ok(json!({
            "url": page.url,
            "title": page.title,
            "tab_id": page.tab.0,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::tests_support::demo_ctx;

    #[tokio::test]
    async fn navigate_returns_page_identity() {
        let (ctx, _target) = demo_ctx().await;
        let result = NavigateHandler
            .run(&ctx, json!({"url": "https://demo.test/login"}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.data.unwrap()["title"], "Login");
    }

    #[tokio::test]
    async fn navigate_to_unknown_url_is_a_target_failure() {
        let (ctx, _target) = demo_ctx().await;
        let err = NavigateHandler
            .run(&ctx, json!({"url": "https://nowhere.invalid"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Target(_)));
    }

    #[tokio::test]
    async fn missing_url_is_invalid_params() {
        let (ctx, _target) = demo_ctx().await;
        let err = NavigateHandler.run(&ctx, json!({})).await.unwrap_err();
        assert!(matches!(err, ActionError::InvalidParams { .. }));
    }
}
