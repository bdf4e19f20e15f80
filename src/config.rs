//! Engine configuration.
//!
//! Layered the usual way: built-in defaults, then an optional config file,
//! then `PAGEPILOT_`-prefixed environment variables.

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// TTL of the element resolution cache, in milliseconds.
    pub cache_ttl_ms: u64,

    /// Default per-action deadline when a scheduled action carries none.
    pub default_timeout_ms: u64,

    /// Default attempt budget for CLI-dispatched actions.
    pub max_retries: u32,

    /// Progress event bus capacity.
    pub event_capacity: usize,

    /// Emit JSON logs instead of the human-readable format.
    pub log_json: bool,

    /// Default tracing filter, overridable with RUST_LOG.
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: 30_000,
            default_timeout_ms: 30_000,
            max_retries: 3,
            event_capacity: 256,
            log_json: false,
            log_filter: "info".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(Environment::with_prefix("PAGEPILOT"));
        builder.build()?.try_deserialize()
    }
}
