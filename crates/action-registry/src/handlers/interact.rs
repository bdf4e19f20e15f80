//! Element interaction handlers: click, type, keys, dropdowns

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::action::{parse_params, ActionCtx, ActionHandler};
use crate::errors::ActionError;
use crate::params::{
    ClickParams, DropdownOptionsParams, InputTextParams, SelectDropdownParams, SendKeysParams,
};
use crate::result::ActionResult;

pub struct ClickHandler;

#[async_trait]
impl ActionHandler for ClickHandler {
    async fn run(&self, ctx: &ActionCtx, params: Value) -> Result<ActionResult, ActionError> {
        let params: ClickParams = parse_params("click_element", params)?;
        let node = ctx.node_at(params.index).await?;
        debug!(index = params.index, locator = %node.locator, "clicking");
        ctx.adapter.click_node(&node).await?;
        Ok(ActionResult::ok(json!({
            "index": params.index,
            "locator": node.locator,
            "tag": node.tag,
            "text": node.text,
        })))
    }
}

pub struct InputTextHandler;

#[async_trait]
impl ActionHandler for InputTextHandler {
    async fn run(&self, ctx: &ActionCtx, params: Value) -> Result<ActionResult, ActionError> {
        let params: InputTextParams = parse_params("input_text", params)?;
        let node = ctx.node_at(params.index).await?;
        ctx.adapter.input_text(&node, &params.text).await?;
        Ok(ActionResult::ok(json!({
            "index": params.index,
            "locator": node.locator,
            "chars": params.text.chars().count(),
        })))
    }
}

pub struct SendKeysHandler;

#[async_trait]
impl ActionHandler for SendKeysHandler {
    async fn run(&self, ctx: &ActionCtx, params: Value) -> Result<ActionResult, ActionError> {
        let params: SendKeysParams = parse_params("send_keys", params)?;
        ctx.adapter.send_keys(&params.keys).await?;
        Ok(ActionResult::ok(json!({ "keys": params.keys })))
    }
}

pub struct DropdownOptionsHandler;

#[async_trait]
impl ActionHandler for DropdownOptionsHandler {
    async fn run(&self, ctx: &ActionCtx, params: Value) -> Result<ActionResult, ActionError> {
        let params: DropdownOptionsParams = parse_params("get_dropdown_options", params)?;
        let node = ctx.node_at(params.index).await?;
        let options = ctx.adapter.dropdown_options(&node).await?;
        Ok(ActionResult::ok(json!({
            "index": params.index,
            "options": options,
        })))
    }
}

pub struct SelectDropdownHandler;

#[async_trait]
impl ActionHandler for SelectDropdownHandler {
    async fn run(&self, ctx: &ActionCtx, params: Value) -> Result<ActionResult, ActionError> {
        let params: SelectDropdownParams = parse_params("select_dropdown_option", params)?;
        let node = ctx.node_at(params.index).await?;
        let label = ctx
            .adapter
            .select_dropdown_option(&node, &params.value)
            .await?;
        Ok(ActionResult::ok(json!({
            "index": params.index,
            "value": params.value,
            "label": label,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::handlers::tests_support::demo_ctx;

    #[tokio::test]
    async fn click_by_index_hits_the_target() {
        let (ctx, target) = demo_ctx().await;
        let result = ClickHandler.run(&ctx, json!({"index": 0})).await.unwrap();
        assert!(result.success);
        assert_eq!(target.clicks(), vec!["body>button:nth(0)".to_string()]);
    }

    #[tokio::test]
    async fn click_out_of_range_is_element_not_found() {
        let (ctx, _target) = demo_ctx().await;
        let err = ClickHandler.run(&ctx, json!({"index": 99})).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ElementNotFound);
    }

    #[tokio::test]
    async fn input_text_types_into_the_field() {
        let (ctx, target) = demo_ctx().await;
        let result = InputTextHandler
            .run(&ctx, json!({"index": 1, "text": "rust testing"}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.data.unwrap()["chars"], 12);
        assert_eq!(target.inputs().len(), 1);
    }

    #[tokio::test]
    async fn dropdown_roundtrip() {
        let (ctx, _target) = demo_ctx().await;
        let options = DropdownOptionsHandler
            .run(&ctx, json!({"index": 2}))
            .await
            .unwrap();
        let listed = options.data.unwrap();
        assert_eq!(listed["options"].as_array().unwrap().len(), 2);

        let selected = SelectDropdownHandler
            .run(&ctx, json!({"index": 2, "value": "fr"}))
            .await
            .unwrap();
        assert_eq!(selected.data.unwrap()["label"], "French");

        let err = SelectDropdownHandler
            .run(&ctx, json!({"index": 2, "value": "de"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TargetFailure);
    }

    #[tokio::test]
    async fn send_keys_requires_keys_param() {
        let (ctx, target) = demo_ctx().await;
        SendKeysHandler
            .run(&ctx, json!({"keys": "Control+a"}))
            .await
            .unwrap();
        assert_eq!(target.sent_keys(), vec!["Control+a".to_string()]);

        let err = SendKeysHandler.run(&ctx, json!({})).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParams);
    }
}
