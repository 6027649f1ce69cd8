//! Durable chunk source: a directory of chunk files

use crate::error::PipelineError;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use techrag_domain::Chunk;

const CHUNKS_SUFFIX: &str = "_chunks";

/// List `*.json` files in `dir`, sorted by path
pub fn list_json_files(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let entries = fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| PipelineError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Document id of a chunk file: the stem with a trailing `_chunks` removed.
///
/// ```
/// use std::path::Path;
/// use techrag_pipeline::document_id_for_chunks;
///
/// assert_eq!(document_id_for_chunks(Path::new("in/acme_10k_chunks.json")), "acme_10k");
/// assert_eq!(document_id_for_chunks(Path::new("in/plain.json")), "plain");
/// ```
pub fn document_id_for_chunks(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.strip_suffix(CHUNKS_SUFFIX) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => stem,
    }
}

/// Pair every file with its document id, rejecting ids that repeat.
///
/// Order of `files` is kept.
pub(crate) fn unique_documents(
    files: Vec<PathBuf>,
    document_id: impl Fn(&Path) -> String,
) -> Result<Vec<(String, PathBuf)>, PipelineError> {
    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        let id = document_id(&path);
        if let Some(first) = seen.get(&id) {
            return Err(PipelineError::DuplicateDocument {
                document_id: id,
                first: first.clone(),
                second: path,
            });
        }
        seen.insert(id.clone(), path.clone());
        documents.push((id, path));
    }
    Ok(documents)
}

/// Read the chunks of one file, in file order
pub fn read_chunks(path: &Path) -> Result<Vec<Chunk>, PipelineError> {
    let raw = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    serde_json::from_str(&raw).map_err(|source| PipelineError::Json {
        path: path.to_path_buf(),
        source,
    })
}
