//! Command-level tests that run without any remote service

use std::fs;
use techrag_cli::cli::{ExtractArgs, IngestArgs, PathArgs, PolicyArg};
use techrag_cli::commands::{execute_extract, execute_ingest};
use techrag_cli::{CliError, Formatter, OutputFormat};
use techrag_domain::CancellationSignal;
use techrag_pipeline::{PipelineConfig, PipelineError};
use tempfile::TempDir;

fn formatter() -> Formatter {
    Formatter::new(OutputFormat::Json, false)
}

fn dry_run(dir: &TempDir) -> IngestArgs {
    IngestArgs {
        paths: PathArgs {
            chunks_dir: None,
            intermediate_dir: Some(dir.path().to_path_buf()),
        },
        policy: Some(PolicyArg::BoundedParallel),
        endpoint: None,
        dry_run: true,
        no_clear: false,
    }
}

#[tokio::test]
async fn test_dry_run_ingest_succeeds() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("acme_clean.json"),
        r#"[{"info": "Revenue was $5B", "data": {"revenue": "5B"}, "chunk_id": 0}]"#,
    )
    .unwrap();

    let result = execute_ingest(
        dry_run(&dir),
        PipelineConfig::default(),
        CancellationSignal::new(),
        &formatter(),
    )
    .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_corrupt_intermediate_is_fatal() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("acme_clean.json"), "{ not json").unwrap();

    let result = execute_ingest(
        dry_run(&dir),
        PipelineConfig::default(),
        CancellationSignal::new(),
        &formatter(),
    )
    .await;

    assert!(matches!(
        result,
        Err(CliError::Pipeline(PipelineError::Intermediate { .. }))
    ));
}

#[tokio::test]
async fn test_extract_requires_api_key() {
    let dir = TempDir::new().unwrap();
    let mut config = PipelineConfig::default();
    config.transformer.api_key_env = "TECHRAG_TEST_KEY_THAT_IS_NEVER_SET".to_string();

    let args = ExtractArgs {
        paths: PathArgs {
            chunks_dir: Some(dir.path().to_path_buf()),
            intermediate_dir: Some(dir.path().join("out")),
        },
        batch_size: None,
        instructions: None,
    };

    let result = execute_extract(args, config, CancellationSignal::new(), &formatter()).await;
    match result {
        Err(CliError::Config(message)) => {
            assert!(message.contains("TECHRAG_TEST_KEY_THAT_IS_NEVER_SET"))
        }
        other => panic!("expected a configuration error, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn test_invalid_override_is_rejected_before_work() {
    let dir = TempDir::new().unwrap();
    let mut config = PipelineConfig::default();
    config.store.endpoint = String::new();

    let result = execute_ingest(dry_run(&dir), config, CancellationSignal::new(), &formatter()).await;
    assert!(matches!(result, Err(CliError::Config(_))));
}
