//! TechRAG CLI - Extract structured records from filings and ingest them as graph episodes.

use clap::Parser;
use techrag_cli::commands;
use techrag_cli::{config, Cli, Command, Formatter};
use techrag_domain::CancellationSignal;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> techrag_cli::Result<()> {
    let cli = Cli::parse();

    let pipeline = config::load(cli.config.as_deref(), cli.preset)?;
    let formatter = Formatter::new(cli.format.into(), !cli.no_color);

    // Ctrl-C stops new work; in-flight calls settle and the summary is still printed
    let cancel = CancellationSignal::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing in-flight work");
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Command::Extract(args) => {
            commands::execute_extract(args, pipeline, cancel, &formatter).await?;
        }
        Command::Ingest(args) => {
            commands::execute_ingest(args, pipeline, cancel, &formatter).await?;
        }
        Command::Run(args) => {
            commands::execute_run(args, pipeline, cancel, &formatter).await?;
        }
        Command::Config(command) => {
            commands::execute_config(command, &pipeline, &formatter)?;
        }
    }

    Ok(())
}
