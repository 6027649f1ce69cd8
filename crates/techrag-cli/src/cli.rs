//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// TechRAG CLI - Turn chunked 10-K filings into knowledge-graph episodes.
#[derive(Debug, Parser)]
#[command(name = "techrag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long, global = true, env = "TECHRAG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Start from a built-in preset instead of the defaults
    #[arg(long, value_enum, global = true)]
    pub preset: Option<PresetArg>,

    /// Output format
    #[arg(short, long, value_enum, global = true, default_value = "table")]
    pub format: CliFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// Configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PresetArg {
    /// Defaults
    Default,
    /// Shorter timeouts, larger batches
    Aggressive,
    /// Longer timeouts, fewer concurrent calls
    Lenient,
}

/// Ingestion policy override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Fixed-size concurrent batches, no retry
    Batched,
    /// Semaphore-bounded concurrency with exponential backoff
    BoundedParallel,
    /// One submission at a time with a fixed delay
    Serial,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract structured records from chunk files into the intermediate directory
    Extract(ExtractArgs),

    /// Ingest intermediate results into the graph store
    Ingest(IngestArgs),

    /// Extract, then ingest
    Run(RunArgs),

    /// Show or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Directory overrides shared by every stage.
#[derive(Debug, Clone, Default, Args)]
pub struct PathArgs {
    /// Directory holding `*_chunks.json` files
    #[arg(long)]
    pub chunks_dir: Option<PathBuf>,

    /// Directory holding `*_clean.json` intermediate results
    #[arg(long)]
    pub intermediate_dir: Option<PathBuf>,
}

/// Arguments for the extract command.
#[derive(Debug, Clone, Args)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    /// Chunks per extraction batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// File with custom extraction instructions
    #[arg(long)]
    pub instructions: Option<PathBuf>,
}

/// Arguments for the ingest command.
#[derive(Debug, Clone, Args)]
pub struct IngestArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    /// Ingestion policy
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Graph store endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Use an in-memory graph store instead of the remote service
    #[arg(long)]
    pub dry_run: bool,

    /// Keep existing graph contents
    #[arg(long)]
    pub no_clear: bool,
}

/// Arguments for the run command.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub extract: ExtractArgs,

    /// Ingestion policy
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Graph store endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Use an in-memory graph store instead of the remote service
    #[arg(long)]
    pub dry_run: bool,

    /// Keep existing graph contents
    #[arg(long)]
    pub no_clear: bool,
}

impl RunArgs {
    /// Ingestion half of the arguments
    pub fn ingest_args(&self) -> IngestArgs {
        IngestArgs {
            paths: self.extract.paths.clone(),
            policy: self.policy,
            endpoint: self.endpoint.clone(),
            dry_run: self.dry_run,
            no_clear: self.no_clear,
        }
    }
}

/// Configuration subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,

    /// Validate the effective configuration
    Validate,
}
