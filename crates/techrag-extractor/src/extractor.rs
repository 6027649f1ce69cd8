//! Single-chunk extraction

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::parser::parse_response;
use crate::prompt::Instructions;
use crate::repair::{JsonRepair, LenientRepair};
use crate::types::{ChunkExtraction, ParsedPayload};
use serde_json::{Map, Value};
use std::sync::Arc;
use techrag_domain::{CancellationSignal, Chunk, ExtractionRecord, TextTransformer};
use tokio::time::timeout;
use tracing::debug;

/// Turns one chunk into zero or more [`ExtractionRecord`]s.
///
/// The extractor calls the transformer once per chunk, cleans and parses the
/// answer, drops useless records and tags the rest with the chunk id. It has
/// no side effects beyond the transformer call.
pub struct StructuredExtractor {
    transformer: Arc<dyn TextTransformer>,
    repairer: Arc<dyn JsonRepair>,
    instructions: Instructions,
    config: ExtractorConfig,
}

impl StructuredExtractor {
    /// Create an extractor with the built-in instructions and repairer
    pub fn new(transformer: Arc<dyn TextTransformer>, config: ExtractorConfig) -> Self {
        Self {
            transformer,
            repairer: Arc::new(LenientRepair),
            instructions: Instructions::builtin(),
            config,
        }
    }

    /// Replace the instruction template
    pub fn with_instructions(mut self, instructions: Instructions) -> Self {
        self.instructions = instructions;
        self
    }

    /// Replace the JSON repair strategy
    pub fn with_repairer(mut self, repairer: Arc<dyn JsonRepair>) -> Self {
        self.repairer = repairer;
        self
    }

    /// The configuration in use
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract the records of one chunk.
    ///
    /// A useless answer yields an empty vector, not an error.
    pub async fn extract(&self, chunk: &Chunk) -> Result<Vec<ExtractionRecord>, ExtractorError> {
        self.extract_chunk(chunk, None).await.map(|c| c.records)
    }

    /// Extract one chunk, reporting discarded records as well.
    ///
    /// When `cancel` is already set, no transformer call is made.
    pub async fn extract_chunk(
        &self,
        chunk: &Chunk,
        cancel: Option<&CancellationSignal>,
    ) -> Result<ChunkExtraction, ExtractorError> {
        if cancel.is_some_and(CancellationSignal::is_cancelled) {
            return Err(ExtractorError::Cancelled);
        }

        let response = timeout(
            self.config.transform_timeout(),
            self.transformer
                .transform(self.instructions.as_str(), &chunk.text),
        )
        .await
        .map_err(|_| ExtractorError::Timeout(self.config.transform_timeout_secs))??;

        debug!(chunk_id = chunk.id, "Transformer answered with {} chars", response.len());

        let payload = parse_response(&response, self.repairer.as_ref())?;
        into_records(payload, chunk.id)
    }
}

/// Apply the shape checks, useless-response rule and chunk tagging
fn into_records(payload: ParsedPayload, chunk_id: u64) -> Result<ChunkExtraction, ExtractorError> {
    let objects = match payload {
        ParsedPayload::Single(map) => vec![map],
        ParsedPayload::Many(items) => items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| match item {
                Value::Object(map) => Ok(map),
                other => Err(ExtractorError::Shape(format!(
                    "list element {} is {}, expected an object",
                    idx,
                    json_kind(&other)
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?,
        ParsedPayload::Malformed(value) => {
            return Err(ExtractorError::Shape(format!(
                "expected an object or a list, got {}",
                json_kind(&value)
            )))
        }
    };

    let mut extraction = ChunkExtraction {
        chunk_id,
        ..ChunkExtraction::default()
    };
    for object in objects {
        let record = to_record(object, chunk_id)?;
        if record.is_useless() {
            extraction.discarded += 1;
        } else {
            extraction.records.push(record);
        }
    }
    Ok(extraction)
}

fn to_record(mut object: Map<String, Value>, chunk_id: u64) -> Result<ExtractionRecord, ExtractorError> {
    let info = match object.remove("info") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    };
    let data = match object.remove("data") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(ExtractorError::Shape(format!(
                "\"data\" is {}, expected an object",
                json_kind(&other)
            )))
        }
    };
    // The chunk id is ours to assign.
    object.remove("chunk_id");

    let mut record = ExtractionRecord::new(chunk_id, info, data);
    record.extra = object;
    Ok(record)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
