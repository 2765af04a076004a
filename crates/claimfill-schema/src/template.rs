//! Schema template invariants.
//!
//! Every array in a template must hold either exactly one representative
//! object or one-or-more scalars of a single JSON type. The walker and the
//! structural verifier both depend on this.

use serde_json::Value;

use claimfill_contracts::error::{ClaimfillError, ClaimfillResult};

use crate::path::join;

/// Check `template` against the template invariants.
///
/// The root must be an object. Returns the first violation found, in
/// declaration order.
pub fn validate_template(template: &Value) -> ClaimfillResult<()> {
    if !template.is_object() {
        return Err(ClaimfillError::InvalidTemplate {
            reason: "template root must be a JSON object".to_string(),
        });
    }
    check(template, "")
}

fn check(node: &Value, path: &str) -> ClaimfillResult<()> {
    match node {
        Value::Object(map) => {
            for (key, child) in map {
                if key.is_empty() || key.contains('.') {
                    return Err(invalid(path, format!("key '{key}' is empty or contains '.'")));
                }
                check(child, &join(path, key))?;
            }
            Ok(())
        }
        Value::Array(items) => check_array(items, path),
        _ => Ok(()),
    }
}

fn check_array(items: &[Value], path: &str) -> ClaimfillResult<()> {
    let Some(first) = items.first() else {
        return Err(invalid(path, "array is empty".to_string()));
    };

    match first {
        Value::Object(_) => {
            if items.len() != 1 {
                return Err(invalid(
                    path,
                    format!("array of objects must hold exactly one representative, found {}", items.len()),
                ));
            }
            check(first, path)
        }
        Value::Array(_) => Err(invalid(path, "nested arrays are not supported".to_string())),
        _ => {
            let kind = json_kind(first);
            if let Some(other) = items.iter().find(|v| json_kind(v) != kind) {
                return Err(invalid(
                    path,
                    format!("array mixes {kind} with {}", json_kind(other)),
                ));
            }
            Ok(())
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn invalid(path: &str, detail: String) -> ClaimfillError {
    let at = if path.is_empty() { "<root>" } else { path };
    ClaimfillError::InvalidTemplate { reason: format!("at '{at}': {detail}") }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn accepts_well_formed_template() {
        let template = json!({
            "claimant": { "parties": [{ "name": "", "emails": [""] }] },
            "orders": ["<order_1>", "<order_2>"],
            "attached": true
        });
        assert!(validate_template(&template).is_ok());
    }

    #[test]
    fn rejects_empty_array() {
        let err = validate_template(&json!({ "a": { "b": [] } })).unwrap_err();
        assert!(err.to_string().contains("a.b"));
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn rejects_two_representatives() {
        let err = validate_template(&json!({ "p": [{ "n": "" }, { "n": "" }] })).unwrap_err();
        assert!(err.to_string().contains("exactly one"));
    }

    #[test]
    fn rejects_mixed_scalar_array() {
        let err = validate_template(&json!({ "x": ["a", 1] })).unwrap_err();
        assert!(err.to_string().contains("mixes string with number"));
    }

    #[test]
    fn rejects_non_object_root() {
        assert!(validate_template(&json!(["a"])).is_err());
    }

    #[test]
    fn rejects_dotted_keys() {
        assert!(validate_template(&json!({ "a.b": "" })).is_err());
    }
}
