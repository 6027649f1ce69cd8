//! Loading the effective pipeline configuration.
//!
//! Precedence, lowest to highest: built-in defaults (or `--preset`), the
//! TOML file named by `--config`, then command-line overrides.

use crate::cli::{ExtractArgs, IngestArgs, PathArgs, PolicyArg, PresetArg};
use crate::error::{CliError, Result};
use std::fs;
use std::path::Path;
use techrag_ingest::PolicyConfig;
use techrag_pipeline::PipelineConfig;

/// Starting point before any file or flag is applied
pub fn base_config(preset: Option<PresetArg>) -> PipelineConfig {
    match preset {
        None | Some(PresetArg::Default) => PipelineConfig::default(),
        Some(PresetArg::Aggressive) => PipelineConfig::aggressive(),
        Some(PresetArg::Lenient) => PipelineConfig::lenient(),
    }
}

/// Load the configuration file, or fall back to the preset when none is given.
///
/// A file replaces the preset entirely; fields it omits take their defaults.
pub fn load(path: Option<&Path>, preset: Option<PresetArg>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            let contents = fs::read_to_string(path).map_err(|e| {
                CliError::Config(format!("cannot read {}: {}", path.display(), e))
            })?;
            Ok(toml::from_str(&contents)?)
        }
        None => Ok(base_config(preset)),
    }
}

/// Apply directory overrides
pub fn apply_paths(config: &mut PipelineConfig, paths: &PathArgs) {
    if let Some(dir) = &paths.chunks_dir {
        config.chunks_dir = dir.clone();
    }
    if let Some(dir) = &paths.intermediate_dir {
        config.intermediate_dir = dir.clone();
    }
}

/// Apply extraction overrides
pub fn apply_extract(config: &mut PipelineConfig, args: &ExtractArgs) -> Result<()> {
    apply_paths(config, &args.paths);
    if let Some(batch_size) = args.batch_size {
        if batch_size == 0 {
            return Err(CliError::InvalidInput(
                "--batch-size must be greater than 0".to_string(),
            ));
        }
        config.extraction.batch_size = batch_size;
    }
    if let Some(path) = &args.instructions {
        config.extraction.instructions_path = Some(path.clone());
    }
    Ok(())
}

/// Apply ingestion overrides.
///
/// Switching policy kind resets that policy's knobs to their defaults;
/// naming the configured kind keeps the file's knobs.
pub fn apply_ingest(config: &mut PipelineConfig, args: &IngestArgs) {
    apply_paths(config, &args.paths);
    if let Some(policy) = args.policy {
        let current = config.ingest.policy.label();
        let wanted = policy_for(policy);
        if current != wanted.label() {
            config.ingest.policy = wanted;
        }
    }
    if let Some(endpoint) = &args.endpoint {
        config.store.endpoint = endpoint.clone();
    }
    if args.no_clear {
        config.clear_store = false;
    }
}

fn policy_for(arg: PolicyArg) -> PolicyConfig {
    match arg {
        PolicyArg::Batched => PolicyConfig::batched(),
        PolicyArg::BoundedParallel => PolicyConfig::bounded_parallel(),
        PolicyArg::Serial => PolicyConfig::serial(),
    }
}

/// Validate, mapping the message into a CLI error
pub fn validate(config: &PipelineConfig) -> Result<()> {
    config.validate().map_err(CliError::Config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn ingest_args(policy: Option<PolicyArg>) -> IngestArgs {
        IngestArgs {
            paths: PathArgs::default(),
            policy,
            endpoint: None,
            dry_run: false,
            no_clear: false,
        }
    }

    #[test]
    fn test_load_without_file_uses_preset() {
        let config = load(None, Some(PresetArg::Aggressive)).unwrap();
        assert_eq!(config, PipelineConfig::aggressive());

        let config = load(None, None).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
chunks_dir = "input"

[ingest.policy]
kind = "serial"
delay_ms = 250
"#
        )
        .unwrap();

        let config = load(Some(file.path()), None).unwrap();
        assert_eq!(config.chunks_dir, PathBuf::from("input"));
        assert_eq!(config.ingest.policy, PolicyConfig::Serial { delay_ms: 250 });
        assert_eq!(config.extraction.batch_size, 5);
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "chunks_dir = [").unwrap();
        assert!(matches!(load(Some(file.path()), None), Err(CliError::Toml(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load(Some(Path::new("/nonexistent/techrag.toml")), None);
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_policy_override_keeps_matching_knobs() {
        let mut config = PipelineConfig::default();
        config.ingest.policy = PolicyConfig::Serial { delay_ms: 10 };

        apply_ingest(&mut config, &ingest_args(Some(PolicyArg::Serial)));
        assert_eq!(config.ingest.policy, PolicyConfig::Serial { delay_ms: 10 });

        apply_ingest(&mut config, &ingest_args(Some(PolicyArg::Batched)));
        assert_eq!(config.ingest.policy, PolicyConfig::batched());
    }

    #[test]
    fn test_no_clear_and_endpoint() {
        let mut config = PipelineConfig::default();
        let mut args = ingest_args(None);
        args.no_clear = true;
        args.endpoint = Some("http://graph:9000".to_string());

        apply_ingest(&mut config, &args);
        assert!(!config.clear_store);
        assert_eq!(config.store.endpoint, "http://graph:9000");
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config = PipelineConfig::default();
        let args = ExtractArgs {
            paths: PathArgs::default(),
            batch_size: Some(0),
            instructions: None,
        };
        assert!(matches!(
            apply_extract(&mut config, &args),
            Err(CliError::InvalidInput(_))
        ));
    }
}
