//! Turn a raw transformer answer into a [`ParsedPayload`]

use crate::error::ExtractorError;
use crate::repair::JsonRepair;
use crate::types::ParsedPayload;
use serde_json::Value;
use tracing::debug;

/// Parse a transformer answer.
///
/// Cleanup runs in order: strip one code fence, strict parse, then
/// repair-and-parse. Only when both parses fail is a [`ExtractorError::Parse`]
/// returned.
pub fn parse_response(
    response: &str,
    repairer: &dyn JsonRepair,
) -> Result<ParsedPayload, ExtractorError> {
    let body = strip_code_fence(response);

    match serde_json::from_str::<Value>(body) {
        Ok(value) => Ok(ParsedPayload::from_value(value)),
        Err(strict_err) => {
            debug!("Strict parse failed ({}), attempting repair", strict_err);
            let repaired = repairer.repair(body)?;
            serde_json::from_str::<Value>(&repaired)
                .map(ParsedPayload::from_value)
                .map_err(|e| ExtractorError::Parse(format!("{} (after repair: {})", strict_err, e)))
        }
    }
}

/// Strip a single leading and trailing markdown fence.
///
/// The opening fence line (with any language tag) is removed whole.
pub fn strip_code_fence(response: &str) -> &str {
    let mut body = response.trim();

    if body.starts_with("```") {
        body = match body.split_once('\n') {
            Some((_, rest)) => rest,
            None => &body[3..],
        };
    }
    if let Some(stripped) = body.trim_end().strip_suffix("```") {
        body = stripped;
    }

    body.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repair::LenientRepair;
    use serde_json::json;

    #[test]
    fn test_plain_object() {
        let payload = parse_response(r#"{"info": "x", "data": {}}"#, &LenientRepair).unwrap();
        assert!(matches!(payload, ParsedPayload::Single(map) if map["info"] == "x"));
    }

    #[test]
    fn test_fenced_with_language_tag() {
        let response = "```json\n[{\"info\": \"a\"}, {\"info\": \"b\"}]\n```";
        let payload = parse_response(response, &LenientRepair).unwrap();
        assert!(matches!(payload, ParsedPayload::Many(items) if items.len() == 2));
    }

    #[test]
    fn test_fenced_without_language_tag() {
        assert_eq!(strip_code_fence("```\n{\"key\": 1}\n```"), "{\"key\": 1}");
    }

    #[test]
    fn test_unfenced_is_untouched() {
        assert_eq!(strip_code_fence("  {\"key\": 1}  "), "{\"key\": 1}");
    }

    #[test]
    fn test_repair_fallback() {
        let payload = parse_response("```json\n{\"info\": \"x\", \"data\": {\"a\": 1,},}\n```", &LenientRepair)
            .unwrap();
        assert_eq!(
            payload,
            ParsedPayload::Single(json!({"info": "x", "data": {"a": 1}}).as_object().unwrap().clone())
        );
    }

    #[test]
    fn test_scalar_is_malformed() {
        let payload = parse_response("42", &LenientRepair).unwrap();
        assert_eq!(payload, ParsedPayload::Malformed(json!(42)));
    }

    #[test]
    fn test_unrecoverable_is_parse_error() {
        let result = parse_response("The filing does not say.", &LenientRepair);
        assert!(matches!(result, Err(ExtractorError::Parse(_))));
    }

    struct RefusingRepair;

    impl JsonRepair for RefusingRepair {
        fn repair(&self, raw: &str) -> Result<String, ExtractorError> {
            Ok(raw.to_string())
        }
    }

    #[test]
    fn test_repairer_is_pluggable() {
        let result = parse_response("{\"a\": 1,}", &RefusingRepair);
        assert!(matches!(result, Err(ExtractorError::Parse(msg)) if msg.contains("after repair")));
    }
}
