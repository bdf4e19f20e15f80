//! PagePilot CLI library: engine wiring, configuration and the demo target.

pub mod config;
pub mod demo;
pub mod engine;

pub use config::EngineConfig;
pub use engine::{build_engine, Engine};
