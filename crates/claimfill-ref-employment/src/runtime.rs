//! Wiring for the employment adapter: configuration, verifier and pipeline.

use std::sync::Arc;

use claimfill_config::PipelineConfig;
use claimfill_contracts::error::ClaimfillResult;
use claimfill_core::{traits::ModelClient, Collaborators, Pipeline};
use claimfill_journal::InMemoryJournal;
use claimfill_verify::{claim::amount_rule, record_schema, RecordVerifier};

use crate::{mock_data::CaseFileReader, templates::employment_form};

// ── Pipeline TOML ─────────────────────────────────────────────────────────────

const EMPLOYMENT_CONFIG: &str = include_str!("../config/employment.toml");

pub fn employment_config() -> ClaimfillResult<PipelineConfig> {
    PipelineConfig::from_toml_str(EMPLOYMENT_CONFIG)
}

/// A verifier with the adapter's custom rules registered.
pub fn employment_verifier(claim_value_path: &str) -> RecordVerifier {
    let mut verifier = RecordVerifier::new();
    verifier.register_rule("claim-value-is-amount", amount_rule(claim_value_path));
    verifier
}

/// Build the employment-claim pipeline around `model`, journaling into
/// `journal`.
pub fn build_pipeline(
    model: Arc<dyn ModelClient>,
    journal: Arc<InMemoryJournal>,
) -> ClaimfillResult<Pipeline> {
    let config = employment_config()?;
    let template = employment_form();
    let schema = record_schema(
        config.pipeline.schema_id.clone(),
        &template,
        config.verification_rules()?,
    );
    let verifier = employment_verifier(&config.pipeline.claim_value_path);

    Pipeline::new(
        template,
        &config,
        schema,
        Collaborators {
            model,
            reader: Arc::new(CaseFileReader::new()),
            journal,
            verifier: Arc::new(verifier),
        },
    )
}
