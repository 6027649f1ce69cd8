//! Instruction template sent alongside every chunk

use crate::error::ExtractorError;
use std::path::Path;

/// Instructions given to the transformer as its system message.
///
/// The chunk text travels separately as the user message, so the template
/// never needs to be rendered per chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instructions {
    text: String,
}

impl Instructions {
    /// The built-in extraction template
    pub fn builtin() -> Self {
        Self {
            text: EXTRACTION_INSTRUCTIONS.to_string(),
        }
    }

    /// Use caller-provided instructions verbatim
    pub fn custom(text: impl Into<String>) -> Result<Self, ExtractorError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ExtractorError::Config("instructions must not be empty".to_string()));
        }
        Ok(Self { text })
    }

    /// Load instructions from a file (e.g. a markdown prompt)
    pub fn from_file(path: &Path) -> Result<Self, ExtractorError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ExtractorError::Config(format!(
                "failed to read instructions from {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::custom(text)
    }

    /// Load from `path` when given, otherwise fall back to the built-in template
    pub fn load(path: Option<&Path>) -> Result<Self, ExtractorError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::builtin()),
        }
    }

    /// The instruction text
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl Default for Instructions {
    fn default() -> Self {
        Self::builtin()
    }
}

const EXTRACTION_INSTRUCTIONS: &str = r#"You extract facts from a fragment of an annual financial filing.

Return a single JSON object with exactly two keys:

{
  "info": "one or two sentences summarising the facts in the fragment",
  "data": { "metric_name": value, ... }
}

Rules:
- Use numbers for numeric values, without currency symbols or thousands separators
- Expand abbreviated magnitudes ("$5B" becomes 5000000000)
- Use snake_case keys and include the period when the fragment states one ("revenue_fy2024")
- Keep "info" factual; do not speculate beyond the fragment
- If the fragment holds several unrelated facts, return a JSON array of such objects
- If the fragment holds nothing relevant (boilerplate, tables of contents, signatures),
  return {"info": "No relevant information", "data": {}}

Output JSON only, with no commentary and no code fences."#;
