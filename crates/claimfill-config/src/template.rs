//! Schema template loading.

use std::path::Path;

use serde_json::Value;

use claimfill_contracts::error::{ClaimfillError, ClaimfillResult};
use claimfill_schema::validate_template;

/// Parse a JSON schema template and check its invariants.
pub fn parse_template(s: &str) -> ClaimfillResult<Value> {
    let template: Value = serde_json::from_str(s).map_err(|e| ClaimfillError::ConfigError {
        reason: format!("schema template is not valid JSON: {}", e),
    })?;
    validate_template(&template)?;
    Ok(template)
}

/// Read and validate the schema template at `path`.
pub fn load_template(path: &Path) -> ClaimfillResult<Value> {
    let contents = std::fs::read_to_string(path).map_err(|e| ClaimfillError::ConfigError {
        reason: format!("failed to read schema template '{}': {}", path.display(), e),
    })?;
    parse_template(&contents)
}
