//! Episode module - units of content submitted to the graph store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Kind of content an episode carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeKind {
    /// Free text taken from a record's `info`
    Text,

    /// Serialized JSON taken from a record's `data`
    #[serde(rename = "json")]
    Structured,
}

impl EpisodeKind {
    /// Suffix used in episode names
    pub fn as_str(&self) -> &'static str {
        match self {
            EpisodeKind::Text => "text",
            EpisodeKind::Structured => "json",
        }
    }
}

impl fmt::Display for EpisodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of content submitted to the graph store.
///
/// Episodes are transient: they exist only for the duration of an
/// ingestion run. `name` is unique within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// Run-unique name, `{document}_chunk_{id}_{text|json}`
    pub name: String,

    /// Episode body
    pub content: String,

    /// Text or structured
    pub kind: EpisodeKind,

    /// Human-readable provenance
    pub source_description: String,

    /// Reference time reported to the store
    pub reference_time: DateTime<Utc>,
}

/// Errors raised while mapping records to episodes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EpisodeError {
    /// A record with neither useful info nor data reached the builder
    #[error("Invariant violation: record for chunk {chunk_id} of '{document_id}' has no info and no data")]
    InvariantViolation {
        /// Document the record belongs to
        document_id: String,
        /// Chunk the record was extracted from
        chunk_id: u64,
    },

    /// The structured payload could not be serialized
    #[error("Failed to serialize data for chunk {chunk_id}: {reason}")]
    Serialization {
        /// Chunk the record was extracted from
        chunk_id: u64,
        /// Serializer message
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_suffixes() {
        assert_eq!(EpisodeKind::Text.as_str(), "text");
        assert_eq!(EpisodeKind::Structured.as_str(), "json");
        assert_eq!(EpisodeKind::Structured.to_string(), "json");
    }

    #[test]
    fn test_kind_serde_matches_suffix() {
        assert_eq!(serde_json::to_string(&EpisodeKind::Text).unwrap(), "\"text\"");
        assert_eq!(serde_json::to_string(&EpisodeKind::Structured).unwrap(), "\"json\"");
    }
}
