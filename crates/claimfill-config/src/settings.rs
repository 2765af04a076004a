//! Pipeline configuration loaded from TOML.
//!
//! Every field has a default, so an empty document is a valid configuration.
//!
//! ```toml
//! [pipeline]
//! narrative_sentinel = "claims_text.txt"
//! max_concurrency = 7
//! document_id_length = 4
//! claim_value_path = "claim_details.claim_value"
//! revise_passes = 1
//! schema_id = "employment-claim"
//!
//! [instructions]
//! describe = "Summarize the document..."
//!
//! [[rules]]
//! id = "claimant-name"
//! kind = "required-field"
//! field = "claimant.full_name"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use claimfill_contracts::{
    error::{ClaimfillError, ClaimfillResult},
    verify::VerificationRule,
};

use crate::{instructions::InstructionSet, rule::RuleConfig};

/// Knobs of the document pipeline and repair loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// File name that marks the user's free-text narrative among the inputs.
    pub narrative_sentinel: String,
    /// Upper bound on in-flight model calls within one fan-out stage.
    pub max_concurrency: usize,
    /// Hex characters per document id.
    pub document_id_length: usize,
    /// Dotted path of the claimed total, cross-checked by the claim-value audit.
    pub claim_value_path: String,
    /// Upper bound on Revise rounds. Stops early once nothing is missing.
    pub revise_passes: usize,
    /// Identifier of the record schema built for verification.
    pub schema_id: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            narrative_sentinel: "claims_text.txt".to_string(),
            max_concurrency: 7,
            document_id_length: 4,
            claim_value_path: "claim_details.claim_value".to_string(),
            revise_passes: 1,
            schema_id: "claim-record".to_string(),
        }
    }
}

/// The top-level structure deserialized from a pipeline TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub pipeline: PipelineSettings,
    pub instructions: InstructionSet,
    /// Record verification rules, evaluated in declaration order.
    pub rules: Vec<RuleConfig>,
}

impl PipelineConfig {
    /// Parse `s` as TOML and validate the result.
    ///
    /// Returns `ClaimfillError::ConfigError` if the TOML is malformed, does
    /// not match `PipelineConfig`, or carries out-of-range values.
    pub fn from_toml_str(s: &str) -> ClaimfillResult<Self> {
        let config: PipelineConfig = toml::from_str(s).map_err(|e| ClaimfillError::ConfigError {
            reason: format!("failed to parse pipeline TOML: {}", e),
        })?;
        config.validate()?;
        debug!(
            rules = config.rules.len(),
            max_concurrency = config.pipeline.max_concurrency,
            "pipeline configuration loaded"
        );
        Ok(config)
    }

    /// Read the file at `path` and parse it as pipeline configuration.
    pub fn from_file(path: &Path) -> ClaimfillResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ClaimfillError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> ClaimfillResult<()> {
        let p = &self.pipeline;
        if p.max_concurrency == 0 {
            return Err(config_error("pipeline.max_concurrency must be at least 1"));
        }
        if !(1..=32).contains(&p.document_id_length) {
            return Err(config_error("pipeline.document_id_length must be between 1 and 32"));
        }
        if p.claim_value_path.trim().is_empty() {
            return Err(config_error("pipeline.claim_value_path must not be empty"));
        }
        if p.narrative_sentinel.trim().is_empty() {
            return Err(config_error("pipeline.narrative_sentinel must not be empty"));
        }
        for rule in &self.rules {
            rule.to_verification_rule()?;
        }
        Ok(())
    }

    /// The configured rules in contract form.
    pub fn verification_rules(&self) -> ClaimfillResult<Vec<VerificationRule>> {
        self.rules.iter().map(RuleConfig::to_verification_rule).collect()
    }
}

fn config_error(reason: &str) -> ClaimfillError {
    ClaimfillError::ConfigError { reason: reason.to_string() }
}
