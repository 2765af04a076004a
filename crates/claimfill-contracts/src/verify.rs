//! Record verification schema and report types.
//!
//! After Combine and Revise, the working record is checked against a
//! `RecordSchema`. Findings are advisory: they are surfaced next to the
//! missing-key list, never used to reject the record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What the verifier checks a record against.
///
/// Built once per pipeline from the schema template and the configured rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSchema {
    /// Identifier for this schema (e.g. "employment-claim-v2").
    pub schema_id: String,
    /// JSON Schema document derived from the template, for structural checks.
    /// `Value::Null` disables the structural phase.
    pub json_schema: Value,
    /// Domain rules evaluated after the structural phase.
    pub rules: Vec<VerificationRule>,
}

/// A single verification rule applied to a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRule {
    /// Referenced in findings.
    pub rule_id: String,
    pub description: String,
    pub rule_type: VerificationRuleType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VerificationRuleType {
    /// The field at `field_path` must be present, non-null and non-empty.
    RequiredField {
        /// Dotted path, e.g. "claimant.full_name".
        field_path: String,
    },

    /// The field at `field_path`, when present, must equal one of `allowed`.
    AllowedValues {
        field_path: String,
        allowed: Vec<Value>,
    },

    /// No string at or below `field_path` may contain `pattern`.
    ///
    /// An empty `field_path` scans the whole record, which is how leftover
    /// template placeholders such as "<extracted_" are caught.
    ForbiddenPattern {
        field_path: String,
        pattern: String,
    },

    /// Delegate to a function registered by the hosting application.
    Custom {
        function_name: String,
    },
}

/// The result of running every rule in a `RecordSchema` against a record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationReport {
    /// True only if every check passed.
    pub passed: bool,
    pub failures: Vec<VerificationFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationFailure {
    pub rule_id: String,
    pub message: String,
}
