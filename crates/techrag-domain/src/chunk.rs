//! Chunk module - raw text units produced by the external splitter

use serde::{Deserialize, Serialize};

/// A bounded unit of source text submitted for extraction.
///
/// Chunks are read-only to the pipeline. The `id` is unique within the
/// document the chunk was split from.
///
/// # Examples
///
/// ```
/// use techrag_domain::Chunk;
///
/// let chunk: Chunk = serde_json::from_str(r#"{"id": 3, "text": "Revenue grew", "tokens": 2}"#).unwrap();
/// assert_eq!(chunk.id, 3);
/// assert_eq!(chunk.token_count, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of the chunk within its source document
    pub id: u64,

    /// Raw chunk text
    pub text: String,

    /// Token count reported by the splitter
    #[serde(rename = "tokens", default)]
    pub token_count: u64,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(id: u64, text: impl Into<String>, token_count: u64) -> Self {
        Self {
            id,
            text: text.into(),
            token_count,
        }
    }
}
