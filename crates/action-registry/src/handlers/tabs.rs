//! Tab management handlers

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use pagepilot_core_types::TabId;

use crate::action::{parse_params, ActionCtx, ActionHandler};
use crate::errors::ActionError;
use crate::params::{CloseTabParams, EmptyParams, OpenTabParams, SwitchTabParams};
use crate::result::ActionResult;

pub struct OpenTabHandler;

#[async_trait]
impl ActionHandler for OpenTabHandler {
    async fn run(&self, ctx: &ActionCtx, params: Value) -> Result<ActionResult, ActionError> {
        let params: OpenTabParams = parse_params("open_tab", params)?;
        let tab = ctx.adapter.open_tab(&params.url).await?;
        debug!(url = %params.url, tab = %tab.0, "opened tab");
        Ok(ActionResult::ok(json!({
            "tab_id": tab.0,
            "url": params.url,
        })))
    }
}

pub struct SwitchTabHandler;

#[async_trait]
impl ActionHandler for SwitchTabHandler {
    async fn run(&self, ctx: &ActionCtx, params: Value) -> Result<ActionResult, ActionError> {
        let params: SwitchTabParams = parse_params("switch_tab", params)?;
        ctx.adapter.switch_tab(&TabId(params.tab_id.clone())).await?;
        let page = ctx.adapter.current_page().await?;
        Ok(ActionResult::ok(json!({
            "tab_id": params.tab_id,
            "url": page.url,
        })))
    }
}

pub struct CloseTabHandler;

#[async_trait]
impl ActionHandler for CloseTabHandler {
    async fn run(&self, ctx: &ActionCtx, params: Value) -> Result<ActionResult, ActionError> {
        let params: CloseTabParams = parse_params("close_tab", params)?;
        ctx.adapter.close_tab(&TabId(params.tab_id.clone())).await?;
        Ok(ActionResult::ok(json!({ "tab_id": params.tab_id })))
    }
}

pub struct ListTabsHandler;

#[async_trait]
impl ActionHandler for ListTabsHandler {
    async fn run(&self, ctx: &ActionCtx, params: Value) -> Result<ActionResult, ActionError> {
        let _: EmptyParams = parse_params("list_tabs", params)?;
        let tabs = ctx.adapter.all_tabs().await?;
        Ok(ActionResult::ok(json!({ "tabs": tabs })))
    }
}
