use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use glider_playground::{AppState, PlaygroundConfig};

#[derive(Parser, Debug)]
#[command(name = "glider-playground")]
#[command(about = "Call Glider MCP tools from the terminal", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "glider.toml")]
    config: PathBuf,

    /// Data directory for history storage
    #[arg(short, long, env = "GLIDER_DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    /// Base URL of the Glider server (overrides the configuration file)
    #[arg(short, long, env = "GLIDER_SERVER_URL")]
    server_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect and print the server health
    Status,

    /// List the available tools
    Tools {
        /// Only tools of this category
        #[arg(long)]
        category: Option<String>,
    },

    /// Run a tool and record it in the history
    Call {
        /// Tool id, e.g. find_types
        tool: String,

        /// Parameter as key=value, typed by the tool's declared parameters
        #[arg(short = 'p', long = "param", value_parser = commands::parse_param)]
        params: Vec<(String, String)>,

        /// Start from the tool's nth example
        #[arg(long)]
        example: Option<usize>,
    },

    /// Show or edit the invocation history
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,

        /// Only entries for this tool id
        #[arg(long)]
        tool: Option<String>,

        /// Show every entry instead of the most recent ones
        #[arg(long)]
        all: bool,
    },

    /// Print connection status changes until Ctrl-C
    Watch,
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// Delete one entry
    Remove { id: String },
    /// Delete every entry
    Clear,
    /// Print success and failure counts
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "glider=info".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::debug!("Data directory: {}", args.data_dir.display());

    // Load configuration
    let mut config = PlaygroundConfig::load(&args.config, args.data_dir)?;
    if let Some(url) = args.server_url {
        config.server.base_url = url;
    }

    let state = AppState::new(&config)?;

    match args.command {
        Command::Status => commands::status(&state).await,
        Command::Tools { category } => commands::tools(&state, category.as_deref()),
        Command::Call {
            tool,
            params,
            example,
        } => commands::call(&state, &tool, params, example).await,
        Command::History { action, tool, all } => match action {
            None => commands::history(&state, tool.as_deref(), all),
            Some(HistoryAction::Remove { id }) => commands::history_remove(&state, &id),
            Some(HistoryAction::Clear) => commands::history_clear(&state),
            Some(HistoryAction::Stats) => commands::history_stats(&state),
        },
        Command::Watch => commands::watch(&state).await,
    }
}
