//! CLI entry point for Vocalis.
//!
//! This binary provides the `vocalis` command: classify text, dispatch
//! commands, and manage/run workflows against a local SQLite store.

mod config;
mod helpers;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use vocalis_exec::{ExecutorKind, Executors, NoopExecutor, ShellExecutor};
use vocalis_gateway::Gateway;
use vocalis_workflow::{Step, TriggerKind};

use config::GatewayConfig;
use helpers::init_tracing;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Vocalis — voice/text command gateway.
#[derive(Parser)]
#[command(
    name = "vocalis",
    version,
    about = "Vocalis — voice/text command gateway",
    long_about = "Classifies natural-language input into structured intents and \
                  executes them immediately or as stored multi-step workflows."
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, default_value = "vocalis.toml")]
    config: std::path::PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify text into a structured intent.
    Classify {
        /// The text to classify.
        text: Vec<String>,
    },

    /// Dispatch a command string for immediate execution.
    Dispatch {
        /// The command to run.
        command: Vec<String>,
    },

    /// Manage and run workflows.
    #[command(subcommand)]
    Workflow(WorkflowCommands),
}

#[derive(Subcommand)]
enum WorkflowCommands {
    /// Create a workflow from a JSON step file.
    Create {
        /// Workflow name.
        name: String,
        /// Path to a JSON file containing the step array.
        steps_file: std::path::PathBuf,
        /// Trigger type: manual, voice, or scheduled.
        #[arg(long, default_value = "manual")]
        trigger: String,
        /// Optional description.
        #[arg(long)]
        description: Option<String>,
    },

    /// List stored workflows.
    List {
        #[arg(long, default_value_t = 20)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },

    /// Show one workflow.
    Show {
        /// Workflow id.
        id: String,
    },

    /// Execute a workflow.
    Run {
        /// Workflow id.
        id: String,
        /// Execution parameters as a JSON object.
        #[arg(long, default_value = "{}")]
        params: String,
    },

    /// Analyze a JSON step file without storing it.
    Analyze {
        /// Path to a JSON file containing the step array.
        steps_file: std::path::PathBuf,
    },

    /// Delete a workflow.
    Delete {
        /// Workflow id.
        id: String,
    },

    /// Suggest a workflow from a voice transcript.
    Suggest {
        /// The transcript text.
        transcript: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("info");

    let cli = Cli::parse();
    let config = GatewayConfig::load(&cli.config)?;

    let gateway = build_gateway(&config).await?;

    match cli.command {
        Commands::Classify { text } => {
            let result = gateway.classify(&text.join(" "));
            print_json(&result)
        }
        Commands::Dispatch { command } => {
            let result = gateway.dispatch(&command.join(" "), &HashMap::new()).await;
            print_json(&result)
        }
        Commands::Workflow(command) => run_workflow_command(&gateway, command).await,
    }
}

/// Open the store and assemble the gateway over local executors.
async fn build_gateway(config: &GatewayConfig) -> Result<Gateway> {
    if !config.data_dir.exists() {
        std::fs::create_dir_all(&config.data_dir).context("failed to create data directory")?;
    }

    let db_path = config.db_path();
    let db = vocalis_store::Database::open_and_migrate(db_path.clone())
        .await
        .context("failed to open database")?;
    info!(path = %db_path.display(), "store initialized");

    let cwd = std::env::current_dir()?;
    let executors = Executors::new(
        Arc::new(ShellExecutor::new("shell", cwd).with_timeout(config.shell_timeout_secs)),
        Arc::new(NoopExecutor::new("files", ExecutorKind::FileOperation)),
        Arc::new(NoopExecutor::new("apps", ExecutorKind::AppOperation)),
    );

    Ok(Gateway::new(db, executors))
}

/// Execute a workflow subcommand.
async fn run_workflow_command(gateway: &Gateway, command: WorkflowCommands) -> Result<()> {
    match command {
        WorkflowCommands::Create {
            name,
            steps_file,
            trigger,
            description,
        } => {
            let steps = read_steps(&steps_file)?;
            let trigger: TriggerKind = trigger
                .parse()
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            let id = gateway
                .create_workflow(&name, steps, trigger, description.as_deref())
                .await?;
            println!("{id}");
            Ok(())
        }
        WorkflowCommands::List { limit, offset } => {
            let workflows = gateway.list_workflows(limit, offset).await?;
            print_json(&workflows)
        }
        WorkflowCommands::Show { id } => {
            let workflow = gateway.get_workflow(&id).await?;
            print_json(&workflow)
        }
        WorkflowCommands::Run { id, params } => {
            let parameters: HashMap<String, serde_json::Value> =
                serde_json::from_str(&params).context("--params must be a JSON object")?;
            let result = gateway.execute_workflow(&id, parameters).await?;
            print_json(&result)
        }
        WorkflowCommands::Analyze { steps_file } => {
            let steps = read_steps(&steps_file)?;
            let analysis = gateway.analyze_workflow(&steps, &HashMap::new()).await;
            print_json(&analysis)
        }
        WorkflowCommands::Delete { id } => {
            gateway.delete_workflow(&id).await?;
            println!("deleted {id}");
            Ok(())
        }
        WorkflowCommands::Suggest { transcript } => {
            let suggestion = gateway.suggest_workflow(&transcript.join(" "));
            print_json(&suggestion)
        }
    }
}

/// Read and parse a JSON step array from disk.
fn read_steps(path: &std::path::Path) -> Result<Vec<Step>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read steps file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("steps file {} is not a valid step array", path.display()))
}

/// Pretty-print a serializable value to stdout.
fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
