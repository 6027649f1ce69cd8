//! Extraction records - structured facts produced from a chunk

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Phrases that mark a model answer as carrying no information
const USELESS_MARKERS: [&str; 2] = ["no relevant", "not found"];

/// One structured fact extracted from a chunk.
///
/// A chunk may yield several records. Records are persisted to the
/// intermediate store before they are turned into episodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    /// Free-text summary of the fact (possibly empty)
    #[serde(default)]
    pub info: String,

    /// Structured payload (possibly empty)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Map<String, Value>,

    /// Chunk the record was extracted from
    pub chunk_id: u64,

    /// Any additional fields the model emitted, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExtractionRecord {
    /// Create a record with no extra fields
    pub fn new(chunk_id: u64, info: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            info: info.into(),
            data,
            chunk_id,
            extra: Map::new(),
        }
    }

    /// Whether this record carries nothing worth ingesting.
    ///
    /// A record is useless when its `info` is blank or a "no relevant" /
    /// "not found" answer **and** its `data` is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use techrag_domain::ExtractionRecord;
    /// use serde_json::Map;
    ///
    /// let record = ExtractionRecord::new(0, "No relevant information found.", Map::new());
    /// assert!(record.is_useless());
    /// ```
    pub fn is_useless(&self) -> bool {
        is_useless_info(&self.info) && self.data.is_empty()
    }

    /// Whether the `info` field holds text worth a TEXT episode
    pub fn has_info(&self) -> bool {
        !self.info.trim().is_empty()
    }
}

/// Whether an `info` string is blank or a "nothing here" answer
pub fn is_useless_info(info: &str) -> bool {
    let normalized = info.trim().to_lowercase();
    normalized.is_empty() || USELESS_MARKERS.iter().any(|m| normalized.contains(m))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}
