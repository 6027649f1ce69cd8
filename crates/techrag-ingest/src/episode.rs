//! Mapping of extraction records to episodes

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use techrag_domain::{Episode, EpisodeError, EpisodeKind, ExtractionRecord};

/// Builds episodes from extraction records.
///
/// The mapping is pure: the same records, document id and reference time
/// always produce the same episodes in the same order. Each record yields a
/// TEXT episode when its `info` is non-blank and a STRUCTURED episode when
/// its `data` is non-empty.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use serde_json::json;
/// use techrag_domain::{EpisodeKind, ExtractionRecord};
/// use techrag_ingest::EpisodeBuilder;
///
/// let data = json!({"revenue": 5000000000u64}).as_object().unwrap().clone();
/// let records = vec![ExtractionRecord::new(0, "Revenue $5B", data)];
///
/// let episodes = EpisodeBuilder::default().build(&records, "acme", Utc::now()).unwrap();
/// assert_eq!(episodes.len(), 2);
/// assert_eq!(episodes[0].name, "acme_chunk_0_text");
/// assert_eq!(episodes[1].name, "acme_chunk_0_json");
/// assert_eq!(episodes[1].kind, EpisodeKind::Structured);
/// ```
#[derive(Debug, Clone)]
pub struct EpisodeBuilder {
    source_label: String,
}

impl EpisodeBuilder {
    /// Create a builder that describes sources as `"{document} {label} ..."`
    pub fn new(source_label: impl Into<String>) -> Self {
        Self {
            source_label: source_label.into(),
        }
    }

    /// Map records of one document to episodes.
    ///
    /// Fails with [`EpisodeError::InvariantViolation`] on a record that has
    /// neither info nor data; extraction should have discarded it.
    pub fn build(
        &self,
        records: &[ExtractionRecord],
        document_id: &str,
        reference_time: DateTime<Utc>,
    ) -> Result<Vec<Episode>, EpisodeError> {
        let mut seen: HashMap<u64, usize> = HashMap::new();
        let mut episodes = Vec::with_capacity(records.len() * 2);

        for record in records {
            let has_data = !record.data.is_empty();
            if !record.has_info() && !has_data {
                return Err(EpisodeError::InvariantViolation {
                    document_id: document_id.to_string(),
                    chunk_id: record.chunk_id,
                });
            }

            let ordinal = seen.entry(record.chunk_id).or_insert(0);
            let stem = match *ordinal {
                0 => format!("{}_chunk_{}", document_id, record.chunk_id),
                n => format!("{}_chunk_{}_{}", document_id, record.chunk_id, n),
            };
            *ordinal += 1;

            if record.has_info() {
                episodes.push(Episode {
                    name: format!("{}_{}", stem, EpisodeKind::Text),
                    content: record.info.clone(),
                    kind: EpisodeKind::Text,
                    source_description: format!("{} {} text", document_id, self.source_label),
                    reference_time,
                });
            }

            if has_data {
                let content =
                    serde_json::to_string(&record.data).map_err(|e| EpisodeError::Serialization {
                        chunk_id: record.chunk_id,
                        reason: e.to_string(),
                    })?;
                episodes.push(Episode {
                    name: format!("{}_{}", stem, EpisodeKind::Structured),
                    content,
                    kind: EpisodeKind::Structured,
                    source_description: format!(
                        "{} {} structured data",
                        document_id, self.source_label
                    ),
                    reference_time,
                });
            }
        }

        Ok(episodes)
    }
}

impl Default for EpisodeBuilder {
    fn default() -> Self {
        Self::new("10-K filing")
    }
}
