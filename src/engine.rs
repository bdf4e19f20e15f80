//! Engine assembly: target adapter + resolver + catalogue + orchestrator.

use std::sync::Arc;
use std::time::Duration;

use action_registry::{builtin_registry, ActionRegistry, RegistryError};
use element_resolver::ElementResolver;
use pagepilot_core_types::AgentId;
use pagepilot_event_bus::{ExecutionEvent, InMemoryBus};
use plan_executor::PlanExecutor;
use target_adapter::TargetAdapter;

use crate::config::EngineConfig;

/// A fully wired action execution engine.
pub struct Engine {
    pub adapter: Arc<dyn TargetAdapter>,
    pub resolver: Arc<ElementResolver>,
    pub registry: Arc<ActionRegistry>,
    pub bus: Arc<InMemoryBus<ExecutionEvent>>,
    pub executor: PlanExecutor,
}

/// Wire the built-in catalogue, the resolver and the orchestrator over the
/// given target adapter.
pub fn build_engine(
    adapter: Arc<dyn TargetAdapter>,
    config: &EngineConfig,
) -> Result<Engine, RegistryError> {
    let resolver = Arc::new(ElementResolver::with_cache_ttl(
        adapter.clone(),
        Duration::from_millis(config.cache_ttl_ms),
    ));
    let registry = Arc::new(builtin_registry()?);
    let bus = InMemoryBus::new(config.event_capacity);
    let executor = PlanExecutor::new(
        registry.clone(),
        adapter.clone(),
        resolver.clone(),
        bus.clone(),
    )
    .with_agent_id(AgentId::named("pagepilot"))
    .with_default_timeout_ms(config.default_timeout_ms);
    Ok(Engine {
        adapter,
        resolver,
        registry,
        bus,
        executor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use target_adapter::StubTarget;

    #[test]
    fn engine_wires_the_builtin_catalogue() {
        let engine = build_engine(StubTarget::shared(), &EngineConfig::default()).unwrap();
        assert!(!engine.registry.is_empty());
        assert!(engine.registry.contains("navigate_to"));
        assert!(engine.registry.contains("click_element"));
    }
}
