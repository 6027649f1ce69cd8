//! Config command implementation.

use crate::cli::ConfigCommand;
use crate::config;
use crate::error::Result;
use crate::output::Formatter;
use techrag_pipeline::PipelineConfig;

/// Execute a config subcommand.
pub fn execute_config(
    command: ConfigCommand,
    pipeline: &PipelineConfig,
    formatter: &Formatter,
) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            println!("{}", formatter.format_config(pipeline)?);
        }
        ConfigCommand::Validate => {
            config::validate(pipeline)?;
            println!("{}", formatter.success("Configuration is valid"));
        }
    }
    Ok(())
}
