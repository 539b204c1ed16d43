//! termpilot - interactive terminal entry point
//!
//! Loads configuration, sets up logging and starts the read-eval loop.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use termpilot::agent::{Agent, AgentConfig};
use termpilot::cli::Repl;
use termpilot::config::Config;
use termpilot::llm::OpenAiClient;
use termpilot::logging;
use termpilot::tools::{ToolContext, ToolRegistry};

/// A coding agent in the terminal.
#[derive(Debug, Parser)]
#[command(name = "termpilot", version, about)]
struct Args {
    /// Model or deployment name (overrides AZURE_DEPLOYMENT_NAME)
    #[arg(long)]
    model: Option<String>,

    /// Maximum tool-calling rounds per turn
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Structured log file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Directory the tools operate in
    #[arg(long)]
    workspace: Option<PathBuf>,
}

impl Args {
    fn apply(self, config: &mut Config) -> anyhow::Result<()> {
        if let Some(model) = self.model {
            config.gateway.model = model;
        }
        if let Some(max) = self.max_iterations {
            anyhow::ensure!(max > 0, "--max-iterations must be at least 1");
            config.max_iterations = max;
        }
        if let Some(log_file) = self.log_file {
            config.log_file = log_file;
        }
        if let Some(workspace) = self.workspace {
            config.workspace_path = workspace;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    dotenvy::dotenv().ok();

    let mut config = Config::from_env().context("failed to load configuration")?;
    args.apply(&mut config)?;

    logging::init_logging(&config.log_file).context("failed to initialize logging")?;
    info!(
        target: "system",
        model = %config.gateway.model,
        workspace = %config.workspace_path.display(),
        max_iterations = config.max_iterations,
        "Loaded configuration"
    );

    let workspace = config
        .workspace_path
        .canonicalize()
        .with_context(|| format!("workspace {} is not accessible", config.workspace_path.display()))?;
    config.workspace_path = workspace;

    let llm = OpenAiClient::new(config.gateway.clone(), config.request_timeout)
        .context("failed to build HTTP client")?;
    let tool_ctx = ToolContext::new(&config.workspace_path, config.shell_timeout);
    let agent = Agent::new(
        AgentConfig::from(&config),
        Arc::new(llm),
        ToolRegistry::new(),
        tool_ctx,
    );

    let mut repl = Repl::new(agent, config).await;
    repl.run().await
}
