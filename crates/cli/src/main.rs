use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use playground_manager::PlaygroundConfig;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "playground")]
#[command(about = "Inspect and replay a persisted prompt playground catalogue", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Playground config file (TOML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List tracked files
    Files(StoreArgs),

    /// List the prompts of one tracked file
    Prompts(PromptsArgs),

    /// Reconcile a pre-parsed prompt list against the catalogue
    Reconcile(ReconcileArgs),

    /// Pin a prompt
    Pin(PinArgs),

    /// Remove the pin
    Unpin(StoreArgs),
}

#[derive(Args)]
pub struct StoreArgs {
    /// Store directory
    #[arg(long, default_value = ".playground")]
    pub store: PathBuf,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct PromptsArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Tracked file path
    pub path: String,
}

#[derive(Args)]
pub struct ReconcileArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Path of the file the prompts were parsed from
    #[arg(long)]
    pub path: String,

    /// JSON array of parsed prompts
    #[arg(long)]
    pub prompts: PathBuf,

    /// Cursor offset used to pick the active prompt
    #[arg(long)]
    pub cursor: Option<usize>,

    /// Timestamp (unix ms) stamped on changed records; defaults to now
    #[arg(long)]
    pub timestamp: Option<u64>,

    /// Print the result without writing the catalogue back
    #[arg(long)]
    pub dry_run: bool,

    /// Mint sequential ids instead of random UUIDs
    #[arg(long)]
    pub deterministic_ids: bool,
}

#[derive(Args)]
pub struct PinArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    pub file_id: String,

    pub prompt_id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = match &cli.config {
        Some(path) => PlaygroundConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PlaygroundConfig::default(),
    };

    match cli.command {
        Commands::Files(args) => commands::run_files(&args, &config).await?,
        Commands::Prompts(args) => commands::run_prompts(&args, &config).await?,
        Commands::Reconcile(args) => commands::run_reconcile(&args, &config).await?,
        Commands::Pin(args) => commands::run_pin(&args, &config).await?,
        Commands::Unpin(args) => commands::run_unpin(&args, &config).await?,
    }

    Ok(())
}
