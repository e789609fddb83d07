//! A2A Orchestrator - command line entry point
//!
//! The binary is the composition root: configuration is loaded once, the
//! orchestrator is wired from it, and each subcommand prints JSON on stdout.

use a2a_orchestrator::gateway::{GenerateRequest, GenerationMode};
use a2a_orchestrator::observability::{init_default_logging, TracingDecisionLog};
use a2a_orchestrator::routing::RouteRequest;
use a2a_orchestrator::{JsonMap, Orchestrator, OrchestratorConfig, OrchestratorError};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Agent routing, workflow execution and generation gateway
#[derive(Parser)]
#[command(name = "a2a-orchestrator")]
#[command(about = "Route marketing requests to agents and run agent workflows")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "A2A_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route a free-text request and print the decision
    Route {
        /// Request text
        #[arg(short, long)]
        text: String,
        #[arg(long, default_value = "cli")]
        user: String,
        /// Context object as JSON
        #[arg(long, value_name = "JSON")]
        context: Option<String>,
        /// Bypass model selection
        #[arg(long)]
        force_model: Option<String>,
        /// Also invoke the selected agent
        #[arg(long)]
        invoke: bool,
    },
    /// Call the generation gateway directly
    Generate {
        #[arg(long)]
        role: String,
        #[arg(long)]
        task: String,
        /// Payload object as JSON
        #[arg(long, value_name = "JSON")]
        payload: Option<String>,
        /// Return plain text instead of JSON
        #[arg(long)]
        text: bool,
        /// Explicit model, resolved to its provider
        #[arg(long)]
        model: Option<String>,
    },
    /// Probe every configured provider
    Health,
    /// List or run workflows
    Workflow {
        #[command(subcommand)]
        action: WorkflowAction,
    },
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[derive(Subcommand)]
enum WorkflowAction {
    /// List built-in workflows
    List,
    /// Run a workflow by name
    Run {
        name: String,
        /// Initial payload object as JSON
        #[arg(long, value_name = "JSON")]
        payload: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    if let Err(e) = run(cli.command, config, &cancel).await {
        error!(status = e.status_code(), "Command failed: {}", e);
        let _ = print_json(&e.to_error_body());
        process::exit(1);
    }
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<OrchestratorConfig, Box<dyn std::error::Error>> {
    if let Some(path) = config_path {
        info!("Loading configuration from: {}", path.display());
        return Ok(OrchestratorConfig::load_from_file(path)?);
    }

    for path_str in ["orchestrator.toml", "config/orchestrator.toml"] {
        let path = PathBuf::from(path_str);
        if path.exists() {
            info!("Loading configuration from: {}", path.display());
            return Ok(OrchestratorConfig::load_from_file(&path)?);
        }
    }

    info!("No configuration file found, using defaults");
    Ok(OrchestratorConfig::from_toml_str("")?)
}

fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Received interrupt, cancelling in-flight work");
            cancel.cancel();
        }
    });
}

async fn run(
    command: Commands,
    config: OrchestratorConfig,
    cancel: &CancellationToken,
) -> Result<(), OrchestratorError> {
    if let Commands::Config { show } = command {
        if show {
            let rendered = toml::to_string_pretty(&config)
                .map_err(|e| OrchestratorError::internal_error(e.to_string()))?;
            println!("{rendered}");
        }
        info!("Configuration validation complete");
        return Ok(());
    }

    let orchestrator = Orchestrator::new(&config, Arc::new(TracingDecisionLog));

    match command {
        Commands::Route {
            text,
            user,
            context,
            force_model,
            invoke,
        } => {
            let mut request =
                RouteRequest::new(user, text).with_context(parse_object("context", context)?);
            request.force_model = force_model;

            if invoke {
                let (decision, response) = orchestrator.route_and_invoke(&request, cancel).await?;
                print_json(&serde_json::json!({ "decision": decision, "response": response }))
            } else {
                print_json(&orchestrator.route(&request))
            }
        }
        Commands::Generate {
            role,
            task,
            payload,
            text,
            model,
        } => {
            let mode = if text {
                GenerationMode::Text
            } else {
                GenerationMode::Json
            };
            let mut request =
                GenerateRequest::new(role, task, parse_object("payload", payload)?).with_mode(mode);
            if let Some(model) = model {
                request = request.with_override_model(model);
            }
            print_json(&orchestrator.generate(request, cancel).await?)
        }
        Commands::Health => print_json(&orchestrator.health_check().await),
        Commands::Workflow { action } => match action {
            WorkflowAction::List => {
                let definitions: Vec<_> = orchestrator.workflows().definitions().collect();
                print_json(&definitions)
            }
            WorkflowAction::Run { name, payload } => {
                let result = orchestrator
                    .execute_workflow(&name, parse_object("payload", payload)?, cancel)
                    .await?;
                print_json(&result)
            }
        },
        Commands::Config { .. } => Ok(()),
    }
}

fn parse_object(field: &str, raw: Option<String>) -> Result<JsonMap, OrchestratorError> {
    let Some(raw) = raw else {
        return Ok(JsonMap::new());
    };

    match serde_json::from_str(&raw) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(OrchestratorError::validation(format!(
            "--{field} must be a JSON object"
        ))),
        Err(e) => Err(OrchestratorError::validation(format!(
            "--{field} is not valid JSON: {e}"
        ))),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), OrchestratorError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| OrchestratorError::internal_error(e.to_string()))?;
    println!("{rendered}");
    Ok(())
}
