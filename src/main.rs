use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pagepilot_cli::demo::{demo_target, HOME_URL};
use pagepilot_cli::{build_engine, EngineConfig};
use pagepilot_event_bus::EventBus;
use plan_executor::{BatchMode, EnhancedAction, ExecutionPlan};

#[derive(Parser)]
#[command(
    name = "pagepilot",
    about = "Action execution engine for web automation agents",
    version
)]
struct Cli {
    /// Path to a config file (yaml/toml/json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the action catalogue advertisement.
    Actions {
        /// Emit the full JSON advertisement including parameter schemas.
        #[arg(long)]
        json: bool,
    },

    /// Run a single action against the demo target.
    Run {
        /// Catalogue name, e.g. `navigate_to`.
        action: String,

        /// JSON parameters for the action.
        #[arg(long, default_value = "{}")]
        params: String,
    },

    /// Execute a plan file (JSON or YAML) against the demo target.
    Plan {
        file: PathBuf,

        /// Stream progress events to stdout while the plan runs.
        #[arg(long)]
        events: bool,
    },

    /// Run a short scripted batch against the demo target.
    Demo,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = EngineConfig::load(cli.config.as_deref()).context("loading configuration")?;
    init_tracing(&config);

    let target = demo_target();
    let engine = build_engine(target, &config).context("building engine")?;
    engine
        .adapter
        .navigate(HOME_URL)
        .await
        .context("opening demo home page")?;

    match cli.command {
        Command::Actions { json } => {
            let advertised = engine.registry.describe();
            if json {
                println!("{}", serde_json::to_string_pretty(&advertised)?);
            } else {
                for (name, descriptor) in advertised {
                    let index_marker = if descriptor.has_target_index { " [index]" } else { "" };
                    println!("{name}{index_marker}\n    {}", descriptor.description);
                }
            }
        }

        Command::Run { action, params } => {
            let params: Value =
                serde_json::from_str(&params).context("parsing --params as JSON")?;
            let action = EnhancedAction::new("cli", action)
                .with_params(params)
                .with_max_retries(config.max_retries)
                .with_timeout_ms(config.default_timeout_ms);
            let result = engine
                .executor
                .execute_with_retry(&action, &CancellationToken::new())
                .await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.success {
                std::process::exit(1);
            }
        }

        Command::Plan { file, events } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading plan file {}", file.display()))?;
            let plan: ExecutionPlan = match file.extension().and_then(|ext| ext.to_str()) {
                Some("yaml") | Some("yml") => {
                    serde_yaml::from_str(&raw).context("parsing YAML plan")?
                }
                _ => serde_json::from_str(&raw).context("parsing JSON plan")?,
            };

            let printer = events.then(|| {
                let mut rx = engine.bus.subscribe();
                tokio::spawn(async move {
                    while let Ok(event) = rx.recv().await {
                        match serde_json::to_string(&event) {
                            Ok(line) => println!("{line}"),
                            Err(err) => warn!(error = %err, "failed to encode event"),
                        }
                    }
                })
            });

            let cancel = CancellationToken::new();
            let interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("interrupt received, stopping further dispatch");
                    interrupt.cancel();
                }
            });

            let report = engine.executor.execute_plan_with_token(&plan, cancel).await?;
            if let Some(printer) = printer {
                printer.abort();
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.success {
                std::process::exit(1);
            }
        }

        Command::Demo => {
            let batch = vec![
                EnhancedAction::new("open-search", "click_element")
                    .with_params(serde_json::json!({"index": 0})),
                EnhancedAction::new("type-query", "input_text")
                    .with_params(serde_json::json!({"index": 0, "text": "pagepilot"})),
                EnhancedAction::new("submit", "click_element")
                    .with_params(serde_json::json!({"index": 1})),
                EnhancedAction::new("read-results", "extract_content"),
            ];
            let results = engine
                .executor
                .execute_actions(&batch, BatchMode::Sequential)
                .await;
            for result in &results {
                println!("{}", serde_json::to_string_pretty(result)?);
            }
            let stats = engine.executor.stats();
            info!(
                total = stats.total,
                completed = stats.completed,
                success_rate = stats.success_rate,
                "demo batch finished"
            );
        }
    }

    Ok(())
}

fn init_tracing(config: &EngineConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.clone()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}
