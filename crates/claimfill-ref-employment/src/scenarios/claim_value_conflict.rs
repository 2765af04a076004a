//! Scenario 2: Claim Value Conflict
//!
//! The claimant's itemised breakdown adds up to AED 407,174.85 but the stated
//! total is AED 307,174.85. The claim-value audit flags the difference, the
//! claim value goes back to the front of the missing keys even though it is
//! filled, and it stays there until the claimant supplies a new value.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};

use claimfill_contracts::{
    error::ClaimfillResult,
    model::ModelReply,
    pipeline::{ProcessOutcome, RepairOutcome},
};
use claimfill_core::{reply_text, CaseSession};
use claimfill_journal::InMemoryJournal;
use claimfill_verify::claim::{check_claim_correct, sum_values};

use crate::{
    mock_data::{CONTRACT_PATH, NARRATIVE, PAYSLIP_PATH, TERMINATION_PATH},
    model::ScriptedModel,
    runtime::build_pipeline,
};

pub const CLAIM_VALUE_PATH: &str = "claim_details.claim_value";

/// The amounts itemised in the claimant's account.
pub const BREAKDOWN: &str = "[75000, 25000, 262174.85, 45000]";

pub fn document_paths() -> Vec<PathBuf> {
    [CONTRACT_PATH, TERMINATION_PATH, PAYSLIP_PATH].into_iter().map(PathBuf::from).collect()
}

/// A session whose model is kept so repair replies can be queued.
pub struct ConflictCase {
    pub model: Arc<ScriptedModel>,
    pub journal: Arc<InMemoryJournal>,
    pub session: CaseSession,
}

impl ConflictCase {
    pub fn new() -> ClaimfillResult<Self> {
        let model = Arc::new(ScriptedModel::new());
        let journal = Arc::new(InMemoryJournal::new());
        let pipeline = build_pipeline(model.clone(), Arc::clone(&journal))?;
        Ok(Self { model, journal, session: CaseSession::new(Arc::new(pipeline)) })
    }

    /// Run the pipeline with the account supplied as text.
    pub async fn intake(&self) -> ClaimfillResult<ProcessOutcome> {
        self.session.process(NARRATIVE, &document_paths()).await
    }

    /// Answer with a corrected claim value.
    pub async fn correct_claim_value(&self, value: &str) -> ClaimfillResult<RepairOutcome> {
        self.model.queue_reconstruct(ModelReply::Structured(json!({ CLAIM_VALUE_PATH: value })));
        self.session.repair(&format!("Sorry, the total should be {value}.")).await
    }
}

fn claim_value(record: &Value) -> &str {
    record["claim_details"]["claim_value"].as_str().unwrap_or("N/A")
}

// ── Scenario runner ───────────────────────────────────────────────────────────

/// Run Scenario 2: Claim Value Conflict.
pub async fn run_scenario() -> ClaimfillResult<()> {
    println!("=== Scenario 2: Claim Value Conflict ===");
    println!();

    let case = ConflictCase::new()?;
    let outcome = case.intake().await?;

    println!("  Claimed value in record: {}", claim_value(&outcome.record));
    println!("  Claim value conflict:    {}", outcome.flags.claim_value_conflict);
    println!("  First missing key:       {}", outcome.missing_keys.first().map(String::as_str).unwrap_or("-"));

    // The evaluator's arithmetic, reproduced.
    match sum_values(BREAKDOWN) {
        Ok(calculated) => match check_claim_correct(&format!("{calculated},307174.85")) {
            Ok(verdict) => println!("  Recomputed:              {verdict}"),
            Err(e) => println!("  Recomputed:              {e}"),
        },
        Err(e) => println!("  Recomputed:              {e}"),
    }
    println!();

    let first = case.correct_claim_value("AED 407,174.85").await?;
    println!("  Claimant: Sorry, the total should be AED 407,174.85.");
    println!("  Assistant: {}", reply_text(&first).lines().next().unwrap_or_default());
    println!();
    println!("  Claimed value in record: {}", claim_value(&first.record));
    println!("  First missing key:       {}", first.missing_keys.first().map(String::as_str).unwrap_or("-"));
    println!("  Repair phase:            {:?}", first.phase);
    println!();

    let case_id = case.session.case_id().await;
    println!(
        "  Journal integrity:       {}",
        if case.journal.verify_integrity(&case_id) { "VERIFIED" } else { "FAILED" }
    );
    println!();
    println!("  Scenario 2 complete.");
    println!();

    Ok(())
}
