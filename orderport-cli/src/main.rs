//! Orderport CLI: import order line items into Shopify.
//!
//! Runs the CSV source and then the API source through aggregation and
//! upload. Source and per-order failures are logged; the process still exits
//! successfully once every source has been attempted.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Orderport: import orders from CSV files and JSON APIs into Shopify
#[derive(Parser, Debug)]
#[command(name = "orderport", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (searched for orderport.toml)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    /// Options for the default `run` command
    #[command(flatten)]
    run: RunArgs,

    /// Subcommand
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Import orders from the configured sources (default)
    Run(RunArgs),
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Aggregate a CSV file and list the orders it would create
    Preview {
        /// CSV file to read
        #[arg(long)]
        csv: PathBuf,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Write a default orderport.toml into the workspace
    Init,
    /// Show the effective configuration (access token masked)
    Show,
}

#[derive(clap::Args, Debug, Clone, Default)]
struct RunArgs {
    /// CSV file to import instead of the configured one
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Orders API URL to import instead of the configured one
    #[arg(long)]
    api_url: Option<String>,

    /// Do not read the CSV source
    #[arg(long)]
    skip_csv: bool,

    /// Do not read the API source
    #[arg(long)]
    skip_api: bool,

    /// Print the order payloads instead of uploading them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "orderport", "orderport")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "orderport.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    if let Some(path) = &cli.config {
        if !path.exists() {
            anyhow::bail!("Configuration file not found: {}", path.display());
        }
    }

    match cli.command {
        Some(Commands::Config { action }) => {
            commands::handle_config(action, &workspace, cli.config.as_deref())
        }
        Some(Commands::Preview { csv }) => {
            commands::handle_preview(&csv, &workspace, cli.config.as_deref()).await
        }
        Some(Commands::Run(args)) => {
            commands::handle_run(args, &workspace, cli.config.as_deref()).await
        }
        None => commands::handle_run(cli.run, &workspace, cli.config.as_deref()).await,
    }
}
