//! Output formatting for the CLI.

use crate::cli::CliFormat;
use crate::error::{CliError, Result};
use colored::*;
use serde::Serialize;
use techrag_domain::{ExtractionStats, RunSummary};
use techrag_pipeline::{ExtractionRun, PipelineConfig};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
}

impl From<CliFormat> for OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => OutputFormat::Table,
            CliFormat::Json => OutputFormat::Json,
        }
    }
}

#[derive(Serialize)]
struct ExtractionView<'a> {
    written: Vec<String>,
    stats: &'a ExtractionStats,
    cancelled: bool,
}

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the report of an ingestion (or full) run.
    pub fn format_summary(&self, summary: &RunSummary) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(summary)?),
            OutputFormat::Table => Ok(self.format_summary_table(summary)),
        }
    }

    /// Format the report of an extraction-only run.
    pub fn format_extraction(&self, run: &ExtractionRun) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let view = ExtractionView {
                    written: run
                        .written
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect(),
                    stats: &run.stats,
                    cancelled: run.cancelled,
                };
                Ok(serde_json::to_string_pretty(&view)?)
            }
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Metric", "Value"]);
                push_stats(&mut builder, &run.stats);
                builder.push_record(["Files written".to_string(), run.written.len().to_string()]);

                let mut out = vec![styled(builder)];
                for path in &run.written {
                    out.push(format!("  {}", path.display()));
                }
                if run.cancelled {
                    out.push(self.warning("Extraction was cancelled before finishing"));
                }
                Ok(out.join("\n"))
            }
        }
    }

    /// Format the effective configuration.
    pub fn format_config(&self, config: &PipelineConfig) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(config)?),
            OutputFormat::Table => config.to_toml().map_err(CliError::Config),
        }
    }

    fn format_summary_table(&self, summary: &RunSummary) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Metric", "Value"]);
        if let Some(run_id) = summary.run_id {
            builder.push_record(["Run".to_string(), run_id.to_string()]);
        }
        if summary.extraction.chunks > 0 {
            push_stats(&mut builder, &summary.extraction);
        }
        builder.push_record(["Episodes".to_string(), summary.total_episodes.to_string()]);
        builder.push_record(["Succeeded".to_string(), summary.succeeded.to_string()]);
        builder.push_record(["Failed".to_string(), summary.failed.to_string()]);

        let mut out = vec![styled(builder)];
        if !summary.failed_names.is_empty() {
            out.push(self.error(&format!("{} episode(s) failed:", summary.failed)));
            for name in &summary.failed_names {
                out.push(format!("  {}", name));
            }
        }
        if summary.cancelled {
            out.push(self.warning("Run was cancelled before finishing"));
        } else if summary.failed == 0 {
            out.push(self.success(&format!(
                "Ingested {} episode(s)",
                summary.succeeded
            )));
        }
        out.join("\n")
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn push_stats(builder: &mut Builder, stats: &ExtractionStats) {
    builder.push_record(["Chunks".to_string(), stats.chunks.to_string()]);
    builder.push_record(["Records".to_string(), stats.records.to_string()]);
    builder.push_record(["Discarded".to_string(), stats.discarded.to_string()]);
    builder.push_record([
        "Chunk errors".to_string(),
        format!("{} ({} transform)", stats.errored, stats.transform_failures),
    ]);
}

fn styled(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}
