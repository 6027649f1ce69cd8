//! Durable intermediate store for extraction results
//!
//! One pretty-printed JSON array per source document, named
//! `{document}_clean.json`. Everything written here survives a crash, so
//! ingestion can be rerun without extracting again.

use crate::error::PipelineError;
use crate::source::{list_json_files, unique_documents};
use std::fs;
use std::path::{Path, PathBuf};
use techrag_domain::ExtractionRecord;

const CLEAN_SUFFIX: &str = "_clean";

/// Directory-backed store of extraction results
#[derive(Debug, Clone)]
pub struct IntermediateStore {
    dir: PathBuf,
}

impl IntermediateStore {
    /// Use `dir` as the store location
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store location
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the results of `document_id`
    pub fn path_for(&self, document_id: &str) -> PathBuf {
        self.dir.join(format!("{}{}.json", document_id, CLEAN_SUFFIX))
    }

    /// Persist the records of one document, replacing any previous file.
    ///
    /// The file is written beside its final name and renamed into place.
    pub fn write(&self, document_id: &str, records: &[ExtractionRecord]) -> Result<PathBuf, PipelineError> {
        let path = self.path_for(document_id);
        fs::create_dir_all(&self.dir).map_err(|e| intermediate(&self.dir, e))?;

        let body = serde_json::to_string_pretty(records).map_err(|e| intermediate(&path, e))?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, body).map_err(|e| intermediate(&staging, e))?;
        fs::rename(&staging, &path).map_err(|e| intermediate(&path, e))?;
        Ok(path)
    }

    /// Load the records of one file
    pub fn read(&self, path: &Path) -> Result<Vec<ExtractionRecord>, PipelineError> {
        let raw = fs::read_to_string(path).map_err(|e| intermediate(path, e))?;
        serde_json::from_str(&raw).map_err(|e| intermediate(path, e))
    }

    /// Every stored document as `(document_id, path)`, sorted by path.
    ///
    /// Two files with the same document id (`acme.json` and `acme_clean.json`)
    /// are a [`PipelineError::DuplicateDocument`].
    pub fn documents(&self) -> Result<Vec<(String, PathBuf)>, PipelineError> {
        let files = list_json_files(&self.dir).map_err(|e| PipelineError::Intermediate {
            path: self.dir.clone(),
            reason: e.to_string(),
        })?;
        unique_documents(files, document_id_for_results)
    }
}

/// Document id of a results file: the stem with a trailing `_clean` removed
pub fn document_id_for_results(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.strip_suffix(CLEAN_SUFFIX) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => stem,
    }
}

fn intermediate(path: &Path, reason: impl ToString) -> PipelineError {
    PipelineError::Intermediate {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
