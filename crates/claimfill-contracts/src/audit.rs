//! Advisory audit results: narrative/document conflicts, the claim-value
//! check, documents the case still needs, and uploads the account never
//! mentions.

use serde::{Deserialize, Serialize};

/// Reason carried by the verdict when the claim-value check never ran.
pub const NOT_EVALUATED: &str = "not evaluated";

/// Verdict of the claim-value evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimValueVerdict {
    /// The breakdown adds up to the claimed value.
    Correct,
    /// The breakdown disagrees with the claimed value.
    Conflict { detail: String },
    /// No verdict could be read from the evaluator, or it was not run.
    Undetermined { reason: String },
}

impl ClaimValueVerdict {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Combined output of the audit evaluators.
///
/// Purely advisory: nothing here blocks completion, except that a claim-value
/// conflict forces the claim-value path back onto the missing-key list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub conflicts: Vec<String>,
    pub claim_value: ClaimValueVerdict,
    pub required_documents: Vec<String>,
    /// Uploaded documents the claimant's account does not refer to.
    pub unreferenced_documents: Vec<String>,
    /// Evaluators whose call failed, with the failure text.
    pub unavailable: Vec<String>,
}

impl Default for AuditReport {
    fn default() -> Self {
        Self {
            conflicts: Vec::new(),
            claim_value: ClaimValueVerdict::Undetermined { reason: NOT_EVALUATED.to_string() },
            required_documents: Vec::new(),
            unreferenced_documents: Vec::new(),
            unavailable: Vec::new(),
        }
    }
}
