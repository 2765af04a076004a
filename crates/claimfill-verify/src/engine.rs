//! Record verifier for the claimfill pipeline.
//!
//! `RecordVerifier` implements the `Verifier` trait from `claimfill-core`.
//! Verification runs in two phases:
//!
//! 1. **Structural**: the record is validated against
//!    `RecordSchema::json_schema` using the `jsonschema` crate. The schema is
//!    normally derived from the template by [`structural_schema`].
//! 2. **Rules**: each `VerificationRule` in `RecordSchema::rules` is
//!    evaluated in order. All failures are collected before returning.
//!
//! Unfilled leaves are the repair loop's business, not the verifier's: rules
//! other than `RequiredField` pass silently on a field that is still empty.

use std::collections::HashMap;

use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use claimfill_contracts::{
    error::ClaimfillResult,
    verify::{
        RecordSchema, VerificationFailure, VerificationReport, VerificationRule,
        VerificationRuleType,
    },
};
use claimfill_core::traits::Verifier;
use claimfill_schema::{resolve, walker::is_unfilled_scalar};

/// A caller-supplied verification function.
///
/// Receives the whole record. Returns `Some(message)` when the check fails,
/// or `None` on success.
pub type CustomVerifierFn = Box<dyn Fn(&Value) -> Option<String> + Send + Sync>;

pub struct RecordVerifier {
    custom_rules: HashMap<String, CustomVerifierFn>,
}

impl RecordVerifier {
    /// Create a verifier with no custom rules registered.
    pub fn new() -> Self {
        Self { custom_rules: HashMap::new() }
    }

    /// Register a custom verification function under `name`.
    ///
    /// The name must match the `function_name` of `Custom` rules. Registering
    /// the same name twice replaces the previous function.
    pub fn register_rule(&mut self, name: impl Into<String>, f: CustomVerifierFn) {
        self.custom_rules.insert(name.into(), f);
    }

    fn structural(&self, record: &Value, schema: &RecordSchema, failures: &mut Vec<VerificationFailure>) {
        if schema.json_schema.is_null() {
            return;
        }
        match jsonschema::validator_for(&schema.json_schema) {
            Ok(validator) => {
                for error in validator.iter_errors(record) {
                    let message = format!("structure violation at '{}': {}", error.instance_path, error);
                    warn!(schema_id = %schema.schema_id, %message, "structural validation failure");
                    failures.push(VerificationFailure { rule_id: "json-schema".to_string(), message });
                }
            }
            Err(e) => {
                let message = format!("invalid JSON Schema document: {e}");
                warn!(schema_id = %schema.schema_id, %message, "schema compilation failure");
                failures.push(VerificationFailure { rule_id: "json-schema".to_string(), message });
            }
        }
    }

    fn evaluate(&self, record: &Value, rule: &VerificationRule) -> Option<String> {
        match &rule.rule_type {
            VerificationRuleType::RequiredField { field_path } => match filled(record, field_path) {
                Some(_) => None,
                None => Some(format!("required field '{field_path}' is not filled")),
            },

            VerificationRuleType::AllowedValues { field_path, allowed } => {
                let actual = filled(record, field_path)?;
                if allowed.contains(actual) {
                    None
                } else {
                    Some(format!("field '{field_path}' has value {actual} which is not in the allowed set"))
                }
            }

            // An empty path scans every string in the record.
            VerificationRuleType::ForbiddenPattern { field_path, pattern } => {
                if field_path.is_empty() {
                    let mut hits = Vec::new();
                    collect_matches(record, "", pattern, &mut hits);
                    (!hits.is_empty()).then(|| {
                        format!("pattern '{pattern}' found at {}", hits.join(", "))
                    })
                } else {
                    let text = filled(record, field_path)?.as_str()?;
                    text.contains(pattern.as_str())
                        .then(|| format!("field '{field_path}' contains forbidden pattern '{pattern}'"))
                }
            }

            VerificationRuleType::Custom { function_name } => match self.custom_rules.get(function_name.as_str()) {
                Some(f) => f(record),
                None => Some(format!("no custom rule registered for function name '{function_name}'")),
            },
        }
    }
}

impl Default for RecordVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Verifier for RecordVerifier {
    fn verify(&self, record: &Value, schema: &RecordSchema) -> ClaimfillResult<VerificationReport> {
        let mut failures = Vec::new();

        self.structural(record, schema, &mut failures);

        for rule in &schema.rules {
            debug!(rule_id = %rule.rule_id, description = %rule.description, "evaluating verification rule");
            if let Some(message) = self.evaluate(record, rule) {
                warn!(rule_id = %rule.rule_id, %message, "record rule failed");
                failures.push(VerificationFailure { rule_id: rule.rule_id.clone(), message });
            }
        }

        let passed = failures.is_empty();
        debug!(schema_id = %schema.schema_id, passed, failure_count = failures.len(), "verification complete");
        Ok(VerificationReport { passed, failures })
    }
}

/// The value at `path`, unless it is absent or an unfilled scalar.
fn filled<'v>(record: &'v Value, path: &str) -> Option<&'v Value> {
    resolve(record, path).filter(|v| !is_unfilled_scalar(v))
}

fn collect_matches(value: &Value, path: &str, pattern: &str, hits: &mut Vec<String>) {
    match value {
        Value::String(s) if s.contains(pattern) => hits.push(format!("'{path}'")),
        Value::Object(map) => {
            for (key, child) in map {
                collect_matches(child, &claimfill_schema::path::join(path, key), pattern, hits);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                collect_matches(child, &format!("{path}[{i}]"), pattern, hits);
            }
        }
        _ => {}
    }
}

// ── Schema derivation ─────────────────────────────────────────────────────────

/// Derive a JSON Schema from a record template.
///
/// Objects keep their key set (`additionalProperties: false`), arrays keep
/// their item shape, and scalar placeholders accept any scalar. Nothing is
/// marked required and `null` is accepted everywhere: gaps are reported by
/// the missing-key diff, not by structure.
pub fn structural_schema(template: &Value) -> Value {
    match template {
        Value::Object(map) => {
            let properties: Map<String, Value> =
                map.iter().map(|(k, v)| (k.clone(), structural_schema(v))).collect();
            json!({
                "type": ["object", "null"],
                "properties": properties,
                "additionalProperties": false,
            })
        }
        Value::Array(items) => match items.first() {
            Some(representative) => json!({
                "type": ["array", "null"],
                "items": structural_schema(representative),
            }),
            None => json!({ "type": ["array", "null"] }),
        },
        _ => json!({ "type": ["string", "number", "boolean", "null"] }),
    }
}

/// Build the `RecordSchema` for a template and its configured rules.
pub fn record_schema(
    schema_id: impl Into<String>,
    template: &Value,
    rules: Vec<VerificationRule>,
) -> RecordSchema {
    RecordSchema { schema_id: schema_id.into(), json_schema: structural_schema(template), rules }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use claimfill_contracts::verify::{RecordSchema, VerificationRule, VerificationRuleType};
    use claimfill_core::traits::Verifier;

    use super::{record_schema, structural_schema, RecordVerifier};

    // ── Builder helpers ───────────────────────────────────────────────────────

    fn template() -> serde_json::Value {
        json!({
            "claimant": { "full_name": "Full name", "additional_claimants": [{ "full_name": "Name" }] },
            "claim_details": { "claim_value": "Amount", "final_orders_sought": ["Order"] },
            "mediation": { "preferred": true }
        })
    }

    fn bare_schema(rules: Vec<VerificationRule>) -> RecordSchema {
        RecordSchema { schema_id: "test-record".to_string(), json_schema: serde_json::Value::Null, rules }
    }

    fn rule(id: &str, rule_type: VerificationRuleType) -> VerificationRule {
        VerificationRule { rule_id: id.to_string(), description: String::new(), rule_type }
    }

    // ── Structural tests ──────────────────────────────────────────────────────

    #[test]
    fn test_partial_record_passes_structure() {
        let verifier = RecordVerifier::new();
        let schema = record_schema("claim", &template(), vec![]);
        let record = json!({
            "claimant": { "full_name": "Jane Roe", "additional_claimants": [] },
            "claim_details": { "claim_value": 307174.85, "final_orders_sought": null }
        });

        let report = verifier.verify(&record, &schema).unwrap();

        assert!(report.passed, "expected pass, failures: {:?}", report.failures);
    }

    #[test]
    fn test_object_where_scalar_belongs_fails_structure() {
        let verifier = RecordVerifier::new();
        let schema = record_schema("claim", &template(), vec![]);
        let record = json!({ "claimant": { "full_name": { "first": "Jane" } } });

        let report = verifier.verify(&record, &schema).unwrap();

        assert!(!report.passed);
        assert_eq!(report.failures[0].rule_id, "json-schema");
        assert!(report.failures[0].message.contains("/claimant/full_name"));
    }

    #[test]
    fn test_unknown_keys_are_reported() {
        let verifier = RecordVerifier::new();
        let schema = record_schema("claim", &template(), vec![]);
        let record = json!({ "mediation": { "preferred": true, "venue": "Online" } });

        let report = verifier.verify(&record, &schema).unwrap();

        assert!(!report.passed);
    }

    #[test]
    fn test_derived_schema_keeps_item_shape() {
        let schema = structural_schema(&template());
        let items = &schema["properties"]["claimant"]["properties"]["additional_claimants"]["items"];
        assert!(items["properties"]["full_name"].is_object());
        assert_eq!(schema["additionalProperties"], json!(false));
    }

    // ── Rule tests ────────────────────────────────────────────────────────────

    #[test]
    fn test_required_field_rejects_empty_string() {
        let verifier = RecordVerifier::new();
        let schema = bare_schema(vec![rule(
            "claimant-named",
            VerificationRuleType::RequiredField { field_path: "claimant.full_name".to_string() },
        )]);

        let report = verifier.verify(&json!({ "claimant": { "full_name": "" } }), &schema).unwrap();
        assert!(!report.passed);
        assert!(report.failures[0].message.contains("claimant.full_name"));

        let report = verifier.verify(&json!({ "claimant": { "full_name": "Jane" } }), &schema).unwrap();
        assert!(report.passed);
    }

    #[test]
    fn test_allowed_values_skip_unfilled_fields() {
        let verifier = RecordVerifier::new();
        let schema = bare_schema(vec![rule(
            "mediation-flag",
            VerificationRuleType::AllowedValues {
                field_path: "mediation.preferred".to_string(),
                allowed: vec![json!(true), json!(false)],
            },
        )]);

        assert!(verifier.verify(&json!({}), &schema).unwrap().passed);
        assert!(verifier.verify(&json!({ "mediation": { "preferred": false } }), &schema).unwrap().passed);

        let report = verifier.verify(&json!({ "mediation": { "preferred": "maybe" } }), &schema).unwrap();
        assert!(!report.passed);
        assert_eq!(report.failures[0].rule_id, "mediation-flag");
    }

    #[test]
    fn test_forbidden_pattern_on_one_field() {
        let verifier = RecordVerifier::new();
        let schema = bare_schema(vec![rule(
            "no-placeholder-name",
            VerificationRuleType::ForbiddenPattern {
                field_path: "claimant.full_name".to_string(),
                pattern: "Full name".to_string(),
            },
        )]);

        let report = verifier.verify(&json!({ "claimant": { "full_name": "Full name of claimant" } }), &schema).unwrap();
        assert!(!report.passed);
        assert!(report.failures[0].message.contains("Full name"));
    }

    #[test]
    fn test_forbidden_pattern_scans_whole_record() {
        let verifier = RecordVerifier::new();
        let schema = bare_schema(vec![rule(
            "no-todo",
            VerificationRuleType::ForbiddenPattern { field_path: String::new(), pattern: "TBD".to_string() },
        )]);
        let record = json!({
            "claimant": { "full_name": "Jane Roe" },
            "claim_details": { "final_orders_sought": ["Unpaid salary", "TBD"] }
        });

        let report = verifier.verify(&record, &schema).unwrap();

        assert!(!report.passed);
        assert!(report.failures[0].message.contains("claim_details.final_orders_sought[1]"));
    }

    #[test]
    fn test_custom_rule_receives_the_record() {
        let mut verifier = RecordVerifier::new();
        verifier.register_rule(
            "has-claimant",
            Box::new(|record| record.get("claimant").is_none().then(|| "no claimant section".to_string())),
        );
        let schema = bare_schema(vec![rule(
            "custom-check",
            VerificationRuleType::Custom { function_name: "has-claimant".to_string() },
        )]);

        assert!(verifier.verify(&json!({ "claimant": {} }), &schema).unwrap().passed);
        let report = verifier.verify(&json!({}), &schema).unwrap();
        assert_eq!(report.failures[0].message, "no claimant section");
    }

    #[test]
    fn test_unregistered_custom_rule() {
        let verifier = RecordVerifier::new();
        let schema = bare_schema(vec![rule(
            "phantom-check",
            VerificationRuleType::Custom { function_name: "does-not-exist".to_string() },
        )]);

        let report = verifier.verify(&json!({}), &schema).unwrap();

        assert!(!report.passed);
        assert!(report.failures[0].message.contains("does-not-exist"));
    }
}
