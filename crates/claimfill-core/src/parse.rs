//! Model-output parsing.
//!
//! Models asked for JSON routinely wrap it in code fences, leave comments or
//! trailing commas in it, or surround it with prose. `parse_json` cleans the
//! text up before giving it to serde, and falls back to the outermost `{...}`
//! span when the whole reply does not parse.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use claimfill_contracts::{
    error::{ClaimfillError, ClaimfillResult},
    model::{ModelError, ModelReply, Stage},
};

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").expect("valid regex"));
static BLOCK_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid regex"));
static TRAILING_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([\]}])").expect("valid regex"));
static NON_JSON_LITERAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:undefined|NaN|Infinity)\b").expect("valid regex"));

/// Remove the most common non-JSON artefacts from model output.
///
/// In order: `//` line comments (a `//` directly after `http:` or `https:`
/// is kept), `/* */` block comments, trailing commas before `]` or `}`, and
/// the literals `undefined`, `NaN` and `Infinity` (replaced with `null`).
pub fn clean_json_string(text: &str) -> String {
    let without_line_comments = text
        .lines()
        .map(strip_line_comment)
        .collect::<Vec<_>>()
        .join("\n");
    let without_block_comments = BLOCK_COMMENT_RE.replace_all(&without_line_comments, "");
    let without_trailing_commas = TRAILING_COMMA_RE.replace_all(&without_block_comments, "$1");
    NON_JSON_LITERAL_RE
        .replace_all(&without_trailing_commas, "null")
        .trim()
        .to_string()
}

fn strip_line_comment(line: &str) -> &str {
    for (idx, _) in line.match_indices("//") {
        let before = &line[..idx];
        if !(before.ends_with("http:") || before.ends_with("https:")) {
            return &line[..idx];
        }
    }
    line
}

/// The body of the first fenced code block, or the whole text.
pub fn strip_code_fence(text: &str) -> &str {
    match FENCE_RE.captures(text).and_then(|c| c.get(1)) {
        Some(body) => body.as_str(),
        None => text.trim(),
    }
}

/// Parse model text as JSON after fence stripping and cleaning.
pub fn parse_json(text: &str) -> Result<Value, ModelError> {
    if text.trim().is_empty() {
        return Err(ModelError::Empty);
    }

    let cleaned = clean_json_string(strip_code_fence(text));
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => Ok(value),
        Err(first_err) => {
            if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) {
                if start < end {
                    if let Ok(value) = serde_json::from_str::<Value>(&cleaned[start..=end]) {
                        return Ok(value);
                    }
                }
            }
            Err(ModelError::Unparsable { reason: first_err.to_string(), raw: text.to_string() })
        }
    }
}

/// Turn a stage reply into a JSON object.
///
/// Fails with `ClaimfillError::Model` when the reply cannot be parsed and
/// with `ClaimfillError::SchemaMismatch` when it parses to anything other
/// than an object.
pub fn expect_object(stage: Stage, reply: ModelReply) -> ClaimfillResult<Map<String, Value>> {
    let value = match reply {
        ModelReply::Structured(value) => value,
        ModelReply::Text(text) => parse_json(&text).map_err(|e| ClaimfillError::model(stage, e))?,
    };
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ClaimfillError::SchemaMismatch {
            stage,
            reason: format!("expected a JSON object, found {}", kind_of(&other)),
        }),
    }
}

/// Turn a stage reply into non-empty text.
pub fn expect_text(stage: Stage, reply: ModelReply) -> ClaimfillResult<String> {
    let text = reply.into_text();
    if text.trim().is_empty() {
        return Err(ClaimfillError::model(stage, ModelError::Empty));
    }
    Ok(text.trim().to_string())
}

fn kind_of(value: &Value) -> &'static str {
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
    use serde_json::json;

    use super::*;

    #[test]
    fn strips_fences_and_comments() {
        let text = "Here you go:\n```json\n{\n  \"a\": 1, // note\n  /* block */ \"b\": [1, 2,],\n}\n```";
        assert_eq!(parse_json(text).unwrap(), json!({ "a": 1, "b": [1, 2] }));
    }

    #[test]
    fn keeps_urls_but_drops_comment_after_them() {
        let line = r#""site": "https://adgm.com/courts", // homepage"#;
        assert_eq!(strip_line_comment(line), r#""site": "https://adgm.com/courts", "#);
    }

    #[test]
    fn replaces_non_json_literals() {
        assert_eq!(
            parse_json(r#"{"a": undefined, "b": NaN, "c": Infinity}"#).unwrap(),
            json!({ "a": null, "b": null, "c": null })
        );
    }

    #[test]
    fn falls_back_to_object_span_inside_prose() {
        let text = r#"Sure! The values are {"claimant.full_name": "Jane Doe"} as requested."#;
        assert_eq!(parse_json(text).unwrap(), json!({ "claimant.full_name": "Jane Doe" }));
    }

    #[test]
    fn unparsable_reply_keeps_raw_text() {
        match parse_json("I could not find any of those values.") {
            Err(ModelError::Unparsable { raw, .. }) => {
                assert_eq!(raw, "I could not find any of those values.")
            }
            other => panic!("expected Unparsable, got {:?}", other),
        }
    }

    #[test]
    fn blank_reply_is_empty() {
        assert_eq!(parse_json("  \n"), Err(ModelError::Empty));
    }

    #[test]
    fn array_reply_is_a_schema_mismatch() {
        let err = expect_object(Stage::Combine, ModelReply::Text("[1, 2]".to_string())).unwrap_err();
        assert!(matches!(err, ClaimfillError::SchemaMismatch { stage: Stage::Combine, .. }));
    }

    #[test]
    fn structured_object_passes_through() {
        let map = expect_object(Stage::Revise, ModelReply::Structured(json!({ "a": "b" }))).unwrap();
        assert_eq!(map.get("a"), Some(&json!("b")));
    }
}
