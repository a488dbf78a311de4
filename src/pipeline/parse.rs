//! Response parsing: recover a JSON array from a free-form model reply.
//!
//! Hosted model replies are not contractually JSON — despite the prompt,
//! models wrap the answer in prose ("Here is the extracted data: …"),
//! markdown fences, or both. The parser is therefore lenient about
//! *surrounding* text but strict about the array's *internal* validity:
//! silently accepting malformed records would corrupt downstream data.
//!
//! The algorithm is a fixed three-stage scan:
//!
//! 1. **Fence strip** — if the reply opens a ```` ```json ```` block, work
//!    on the content between that marker and the next closing fence.
//! 2. **Bracket slice** — take the substring from the first `[` to the
//!    last `]` inclusive. No brackets means no array
//!    ([`ExtractError::NoJsonArrayFound`]), or — when the reply has fences
//!    that are not JSON fences — a more specific
//!    [`ExtractError::MarkdownNotJson`].
//! 3. **Parse with one repair attempt** — parse the slice as JSON; on
//!    failure collapse every whitespace run (including embedded newlines)
//!    to a single space and retry once. Models that pretty-print across
//!    lines inside string literals are recovered by this pass; anything
//!    still invalid is [`ExtractError::InvalidJson`].

use crate::error::ExtractError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

static RE_WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

const FENCE: &str = "```";

/// Parse a raw model reply into the untyped entries of its embedded array.
///
/// Entries are returned in array order, untouched — validation and
/// filtering belong to [`crate::pipeline::normalize`].
pub fn parse_reply(reply: &str) -> Result<Vec<Value>, ExtractError> {
    let (working, used_json_fence) = strip_json_fence(reply);

    let start = working.find('[');
    let end = working.rfind(']');

    let (start, end) = match (start, end) {
        (Some(s), Some(e)) if s < e => (s, e),
        _ => {
            // Fences that are not JSON fences deserve the more specific
            // diagnosis: the model answered in markdown, not data.
            if !used_json_fence && reply.contains(FENCE) {
                return Err(ExtractError::MarkdownNotJson);
            }
            return Err(ExtractError::NoJsonArrayFound);
        }
    };

    let slice = &working[start..=end];
    parse_array_text(slice)
}

/// Take the content of the first ```` ```json ```` block if one exists.
///
/// Returns the working text and whether a JSON fence was recognised. A
/// missing closing fence is tolerated — the rest of the reply is used, the
/// bracket slice bounds the array anyway.
fn strip_json_fence(reply: &str) -> (&str, bool) {
    // Case-insensitive search for the opening marker without allocating a
    // lowercased copy (which could shift byte offsets for non-ASCII text).
    let open = reply.match_indices(FENCE).find_map(|(pos, _)| {
        let tag_start = pos + FENCE.len();
        let tag_end = tag_start + "json".len();
        reply
            .get(tag_start..tag_end)
            .filter(|tag| tag.eq_ignore_ascii_case("json"))
            .map(|_| tag_end)
    });

    match open {
        Some(body_start) => {
            let body = &reply[body_start..];
            let inner = match body.find(FENCE) {
                Some(close) => &body[..close],
                None => body,
            };
            (inner, true)
        }
        None => (reply, false),
    }
}

/// Parse candidate array text, with a single whitespace-repair retry.
pub(crate) fn parse_array_text(text: &str) -> Result<Vec<Value>, ExtractError> {
    let value = match serde_json::from_str::<Value>(text) {
        Ok(v) => v,
        Err(first_err) => {
            debug!("Initial JSON parse failed ({first_err}); applying whitespace repair");
            let repaired = RE_WHITESPACE_RUN.replace_all(text, " ");
            serde_json::from_str::<Value>(&repaired).map_err(|e| ExtractError::InvalidJson {
                detail: e.to_string(),
            })?
        }
    };

    match value {
        Value::Array(entries) => Ok(entries),
        other => Err(ExtractError::NotAnArray {
            found: json_type_name(&other).to_string(),
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_array_parses() {
        let entries = parse_reply(r#"[{"label":"Total","value":"100","remarks":""}]"#).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["label"], "Total");
    }

    #[test]
    fn fenced_reply_equals_unwrapped_reply() {
        let inner = r#"[{"label":"Total","value":"100","remarks":""}]"#;
        let fenced = format!("Here is the data:\n```json\n{inner}\n```");
        assert_eq!(parse_reply(&fenced).unwrap(), parse_reply(inner).unwrap());
    }

    #[test]
    fn fence_without_closing_marker_is_tolerated() {
        let reply = "```json\n[{\"label\":\"A\",\"value\":\"1\"}]";
        let entries = parse_reply(reply).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn surrounding_prose_is_ignored() {
        let reply = "Sure! I found these fields:\n[{\"label\":\"A\",\"value\":\"1\"}]\nLet me know if you need more.";
        let entries = parse_reply(reply).unwrap();
        assert_eq!(entries[0]["value"], "1");
    }

    #[test]
    fn no_brackets_is_no_json_array_found() {
        let err = parse_reply("The document contains an invoice for $100.").unwrap_err();
        assert!(matches!(err, ExtractError::NoJsonArrayFound));
    }

    #[test]
    fn non_json_fences_without_array_are_markdown_not_json() {
        let reply = "```\nsome code\n```\nno data here";
        let err = parse_reply(reply).unwrap_err();
        assert!(matches!(err, ExtractError::MarkdownNotJson));
    }

    #[test]
    fn json_fence_without_array_is_no_json_array_found() {
        let err = parse_reply("```json\nnull\n```").unwrap_err();
        assert!(matches!(err, ExtractError::NoJsonArrayFound));
    }

    #[test]
    fn embedded_newlines_recovered_by_repair_pass() {
        // Raw newline inside a string literal is invalid JSON until the
        // whitespace run collapses to a single space.
        let reply = "[{\"label\":\"Address\",\"value\":\"12 Main\nStreet\",\"remarks\":\"\"}]";
        let entries = parse_reply(reply).unwrap();
        assert_eq!(entries[0]["value"], "12 Main Street");
    }

    #[test]
    fn unrepairable_json_is_invalid_json() {
        let err = parse_reply(r#"[{"label": "A", "value": }]"#).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidJson { .. }));
    }

    #[test]
    fn non_array_value_is_rejected() {
        let err = parse_array_text(r#"{"label":"A"}"#).unwrap_err();
        match err {
            ExtractError::NotAnArray { found } => assert_eq!(found, "object"),
            other => panic!("expected NotAnArray, got {other:?}"),
        }
    }

    #[test]
    fn reversed_brackets_are_no_json_array_found() {
        let err = parse_reply("] nothing here [").unwrap_err();
        assert!(matches!(err, ExtractError::NoJsonArrayFound));
    }

    #[test]
    fn nested_arrays_slice_to_outermost() {
        let entries = parse_reply(r#"noise [ [1, 2], [3] ] noise"#).unwrap();
        assert_eq!(entries, vec![json!([1, 2]), json!([3])]);
    }
}
