//! Record verification rules as declared in TOML.
//!
//! A `RuleConfig` is a flat, human-editable form of `VerificationRule`. The
//! `kind` decides which of the optional fields are required.
//!
//! Example in TOML:
//! ```toml
//! [[rules]]
//! id = "claimant-name"
//! description = "The claimant must be named"
//! kind = "required-field"
//! field = "claimant.full_name"
//!
//! [[rules]]
//! id = "no-placeholders"
//! description = "Template placeholders must not leak into the record"
//! kind = "forbidden-pattern"
//! pattern = "<extracted_"
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use claimfill_contracts::{
    error::{ClaimfillError, ClaimfillResult},
    verify::{VerificationRule, VerificationRuleType},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKind {
    RequiredField,
    AllowedValues,
    ForbiddenPattern,
    Custom,
}

/// A single verification rule loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Stable identifier, echoed in verification findings.
    pub id: String,

    #[serde(default)]
    pub description: String,

    pub kind: RuleKind,

    /// Dotted record path. Mandatory for `required-field` and
    /// `allowed-values`; optional for `forbidden-pattern` (whole record).
    pub field: Option<String>,

    /// Mandatory for `allowed-values`.
    #[serde(default)]
    pub allowed: Vec<Value>,

    /// Mandatory for `forbidden-pattern`.
    pub pattern: Option<String>,

    /// Mandatory for `custom`. Names a function registered on the verifier.
    pub function: Option<String>,
}

impl RuleConfig {
    /// Convert into the contract type, checking the kind-specific fields.
    pub fn to_verification_rule(&self) -> ClaimfillResult<VerificationRule> {
        let rule_type = match self.kind {
            RuleKind::RequiredField => VerificationRuleType::RequiredField {
                field_path: self.require(self.field.as_ref(), "field")?,
            },
            RuleKind::AllowedValues => {
                if self.allowed.is_empty() {
                    return Err(self.missing("allowed"));
                }
                VerificationRuleType::AllowedValues {
                    field_path: self.require(self.field.as_ref(), "field")?,
                    allowed: self.allowed.clone(),
                }
            }
            RuleKind::ForbiddenPattern => VerificationRuleType::ForbiddenPattern {
                field_path: self.field.clone().unwrap_or_default(),
                pattern: self.require(self.pattern.as_ref(), "pattern")?,
            },
            RuleKind::Custom => VerificationRuleType::Custom {
                function_name: self.require(self.function.as_ref(), "function")?,
            },
        };

        Ok(VerificationRule {
            rule_id: self.id.clone(),
            description: self.description.clone(),
            rule_type,
        })
    }

    fn require(&self, value: Option<&String>, name: &str) -> ClaimfillResult<String> {
        match value {
            Some(v) if !v.is_empty() => Ok(v.clone()),
            _ => Err(self.missing(name)),
        }
    }

    fn missing(&self, name: &str) -> ClaimfillError {
        ClaimfillError::ConfigError {
            reason: format!("rule '{}' ({:?}) requires a non-empty '{name}'", self.id, self.kind),
        }
    }
}
