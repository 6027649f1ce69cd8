//! Result types for extraction

use serde::Serialize;
use serde_json::{Map, Value};
use techrag_domain::{ExtractionRecord, ExtractionStats};

/// What a transformer answer parsed into
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedPayload {
    /// A single JSON object
    Single(Map<String, Value>),

    /// A JSON array; elements are checked individually
    Many(Vec<Value>),

    /// Valid JSON of any other shape (string, number, bool, null)
    Malformed(Value),
}

impl ParsedPayload {
    /// Classify a parsed JSON value by shape
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => ParsedPayload::Single(map),
            Value::Array(items) => ParsedPayload::Many(items),
            other => ParsedPayload::Malformed(other),
        }
    }
}

/// Records retained from one chunk, plus how many were dropped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkExtraction {
    /// Chunk the records came from
    pub chunk_id: u64,

    /// Records that passed the useless-response rule
    pub records: Vec<ExtractionRecord>,

    /// Records dropped by the useless-response rule
    pub discarded: usize,
}

/// Aggregate result of a batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionReport {
    /// Retained records in submission order
    pub records: Vec<ExtractionRecord>,

    /// Counters for the run
    pub stats: ExtractionStats,

    /// Whether the run stopped early because of cancellation
    pub cancelled: bool,
}

impl ExtractionReport {
    /// Number of retained records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record was retained
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_classification() {
        assert!(matches!(
            ParsedPayload::from_value(json!({"info": "x"})),
            ParsedPayload::Single(_)
        ));
        assert!(matches!(
            ParsedPayload::from_value(json!([1, 2])),
            ParsedPayload::Many(items) if items.len() == 2
        ));
        assert_eq!(
            ParsedPayload::from_value(json!("text")),
            ParsedPayload::Malformed(json!("text"))
        );
    }
}
