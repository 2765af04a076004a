//! Scenario 1: Wage Claim Intake
//!
//! Runs the full document pipeline over one employment case: a contract, a
//! termination letter, a payslip, a scanned bank statement with no text layer,
//! and the claimant's own account under the narrative file name.
//!
//! Walk-through for the demo run:
//!   1. Ingest: the scan fails to read and is carried as a failed unit
//!   2. Describe and Classify: the termination letter is labelled for the defendant
//!   3. Extract and Combine: one record from three fragments
//!   4. Revise: contact details and the claimed total are found in the account
//!   5. Verify and Audit: a start-date conflict, a claim value that does not
//!      add up, and a missing bank statement
//!   6. Journal integrity verified at the end

use std::path::PathBuf;
use std::sync::Arc;

use claimfill_contracts::{document::DocumentUnit, error::ClaimfillResult, pipeline::ProcessOutcome};
use claimfill_journal::InMemoryJournal;

use crate::{
    mock_data::{CONTRACT_PATH, NARRATIVE_PATH, PAYSLIP_PATH, SCAN_PATH, TERMINATION_PATH},
    model::ScriptedModel,
    runtime::build_pipeline,
};

pub const CASE_ID: &str = "case-0417";

/// Every input of the case, narrative included.
pub fn case_paths() -> Vec<PathBuf> {
    [CONTRACT_PATH, TERMINATION_PATH, PAYSLIP_PATH, SCAN_PATH, NARRATIVE_PATH]
        .into_iter()
        .map(PathBuf::from)
        .collect()
}

/// Run the pipeline once and hand back the outcome with the journal it wrote.
pub async fn run_intake() -> ClaimfillResult<(ProcessOutcome, Arc<InMemoryJournal>)> {
    let journal = Arc::new(InMemoryJournal::new());
    let pipeline = build_pipeline(Arc::new(ScriptedModel::new()), Arc::clone(&journal))?;
    let outcome = pipeline.process(CASE_ID, &case_paths()).await?;
    Ok((outcome, journal))
}

fn status(unit: &DocumentUnit) -> String {
    if let Some(error) = &unit.error {
        return format!("FAILED ({error})");
    }
    match &unit.classification {
        Some(c) => format!("read, supports the {}", c.label.as_str()),
        None => "read".to_string(),
    }
}

// ── Scenario runner ───────────────────────────────────────────────────────────

/// Run Scenario 1: Wage Claim Intake.
pub async fn run_scenario() -> ClaimfillResult<()> {
    println!("=== Scenario 1: Wage Claim Intake ===");
    println!();

    let (outcome, journal) = run_intake().await?;

    println!("  Documents:");
    for unit in &outcome.documents {
        println!("    [{}] {:<40} {}", unit.id.as_str(), unit.source().display(), status(unit));
    }
    println!();
    println!("  Case summary: {}", outcome.case_summary);
    println!();

    let flags = &outcome.flags;
    println!("  Documents failed:       {} of {}", flags.documents_failed, flags.documents_total);
    println!("  Conflicts detected:     {}", flags.conflicts_detected);
    println!("  Claim value conflict:   {}", flags.claim_value_conflict);
    println!("  Documents still needed: {}", flags.missing_documents);
    println!("  Unmentioned uploads:    {}", flags.unreferenced_documents);
    println!("  Record findings:        {}", flags.schema_findings);
    println!();

    println!("  Missing keys ({}):", outcome.missing_keys.len());
    for key in &outcome.missing_keys {
        println!("    - {key}");
    }
    println!();

    if !outcome.advisory.is_empty() {
        println!("  Advisory:");
        for line in outcome.advisory.lines() {
            println!("    {line}");
        }
        println!();
    }

    let events = journal.export(CASE_ID).map(|j| j.events.len()).unwrap_or_default();
    println!(
        "  Journal integrity:      {} ({} event(s) in chain)",
        if journal.verify_integrity(CASE_ID) { "VERIFIED" } else { "FAILED" },
        events
    );
    println!();
    println!("  Scenario 1 complete.");
    println!();

    Ok(())
}
