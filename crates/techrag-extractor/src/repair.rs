//! Best-effort recovery of malformed JSON answers
//!
//! Models occasionally truncate their output, leave trailing commas, wrap the
//! JSON in prose or emit typographic quotes. [`LenientRepair`] undoes the
//! common cases; anything it cannot fix still fails to parse afterwards.

use crate::error::ExtractorError;

/// Rewrites a near-JSON string into something a strict parser accepts
pub trait JsonRepair: Send + Sync {
    /// Attempt the repair. The result is not guaranteed to be valid JSON.
    fn repair(&self, raw: &str) -> Result<String, ExtractorError>;
}

/// Character-level repairer for typical model output defects.
///
/// - text before the first `{`/`[` and after the matching close is dropped
/// - smart quotes become ASCII quotes
/// - trailing commas before `}`/`]` are removed
/// - raw newlines inside strings are escaped
/// - `True`/`False`/`None` become `true`/`false`/`null`
/// - unterminated strings, dangling keys and open brackets are closed
///
/// # Examples
///
/// ```
/// use techrag_extractor::{JsonRepair, LenientRepair};
///
/// let fixed = LenientRepair.repair(r#"Sure! {"info": "Revenue", "data": {"a": 1,}"#).unwrap();
/// assert_eq!(fixed, r#"{"info": "Revenue", "data": {"a": 1}}"#);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LenientRepair;

impl JsonRepair for LenientRepair {
    fn repair(&self, raw: &str) -> Result<String, ExtractorError> {
        let normalized: String = raw
            .chars()
            .map(|c| match c {
                '\u{201C}' | '\u{201D}' => '"',
                '\u{2018}' | '\u{2019}' => '\'',
                other => other,
            })
            .collect();

        let start = normalized
            .find(['{', '['])
            .ok_or_else(|| ExtractorError::Parse("no JSON object or array found".to_string()))?;

        let mut out = String::with_capacity(normalized.len() - start);
        let mut closers: Vec<char> = Vec::new();
        let mut in_string = false;
        let mut escaped = false;
        let mut chars = normalized[start..].chars().peekable();

        while let Some(c) = chars.next() {
            if in_string {
                match c {
                    _ if escaped => {
                        escaped = false;
                        out.push(c);
                    }
                    '\\' => {
                        escaped = true;
                        out.push(c);
                    }
                    '"' => {
                        in_string = false;
                        out.push(c);
                    }
                    '\n' => out.push_str("\\n"),
                    '\r' => {}
                    '\t' => out.push_str("\\t"),
                    _ => out.push(c),
                }
                continue;
            }

            match c {
                '"' => {
                    in_string = true;
                    out.push(c);
                }
                '{' => {
                    closers.push('}');
                    out.push(c);
                }
                '[' => {
                    closers.push(']');
                    out.push(c);
                }
                '}' | ']' => {
                    if !closers.contains(&c) {
                        continue;
                    }
                    while let Some(expected) = closers.pop() {
                        drop_trailing_comma(&mut out);
                        out.push(expected);
                        if expected == c {
                            break;
                        }
                    }
                    if closers.is_empty() {
                        return Ok(out);
                    }
                }
                c if c.is_ascii_alphabetic() => {
                    let mut word = String::from(c);
                    while let Some(&next) = chars.peek() {
                        if !next.is_ascii_alphanumeric() && next != '_' {
                            break;
                        }
                        word.push(next);
                        chars.next();
                    }
                    out.push_str(match word.as_str() {
                        "True" => "true",
                        "False" => "false",
                        "None" => "null",
                        _ => &word,
                    });
                }
                _ => out.push(c),
            }
        }

        // Truncated input: close whatever is still open.
        if in_string {
            if escaped {
                out.pop();
            }
            out.push('"');
        }
        let tail = out.trim_end();
        if tail.ends_with(':') {
            out.truncate(tail.len());
            out.push_str(" null");
        }
        while let Some(closer) = closers.pop() {
            drop_trailing_comma(&mut out);
            out.push(closer);
        }
        Ok(out)
    }
}

fn drop_trailing_comma(out: &mut String) {
    let trimmed_len = out.trim_end().len();
    if out[..trimmed_len].ends_with(',') {
        out.truncate(trimmed_len - 1);
    }
}
