//! Scenario 3: Repair Conversation
//!
//! After intake the claimant completes the form in chat. The first reply is
//! too vague to map onto any field and comes back as a diagnostic with the
//! record untouched. The second answers every missing field, which completes
//! the record. Once complete, messages go to free conversation and the case
//! summary is regenerated from the finished record.

use std::sync::Arc;

use serde_json::Value;

use claimfill_contracts::{
    error::ClaimfillResult,
    model::ModelReply,
    pipeline::{FlatPatch, RepairOutcome},
};
use claimfill_core::{reply_text, CaseSession};
use claimfill_journal::InMemoryJournal;

use crate::{
    mock_data::{claimant_answer, NARRATIVE},
    model::ScriptedModel,
    runtime::build_pipeline,
    scenarios::claim_value_conflict::document_paths,
};

pub const VAGUE_REPLY: &str = "I'm not sure, whatever you think is best.";
pub const FULL_REPLY: &str = "Here are the rest of my details, and the correct total is AED 407,174.85.";
pub const QUESTION: &str = "What happens next?";

/// The patch a claimant's full answer turns into.
///
/// Each distinct missing key gets the claimant's answer for it.
pub fn answers_for(missing_keys: &[String]) -> FlatPatch {
    let mut patch = FlatPatch::new();
    for key in missing_keys {
        if !patch.contains_key(key) {
            patch.insert(key.clone(), claimant_answer(key));
        }
    }
    patch
}

/// Every outcome of one run through the conversation, in order.
pub struct Conversation {
    pub vague: RepairOutcome,
    pub full: RepairOutcome,
    pub question: RepairOutcome,
    pub summary: String,
    pub record: Value,
}

pub async fn converse(journal: Arc<InMemoryJournal>) -> ClaimfillResult<(Conversation, String)> {
    let model = Arc::new(ScriptedModel::new());
    let pipeline = build_pipeline(model.clone(), journal)?;
    let session = CaseSession::new(Arc::new(pipeline));

    session.process(NARRATIVE, &document_paths()).await?;

    let vague = session.repair(VAGUE_REPLY).await?;

    let patch = answers_for(&session.snapshot().await.missing_keys);
    model.queue_reconstruct(ModelReply::Structured(Value::Object(patch)));
    let full = session.repair(FULL_REPLY).await?;

    let question = session.repair(QUESTION).await?;
    let summary = session.refresh_summary().await?;

    let state = session.snapshot().await;
    Ok((Conversation { vague, full, question, summary, record: state.record }, state.case_id))
}

// ── Scenario runner ───────────────────────────────────────────────────────────

/// Run Scenario 3: Repair Conversation.
pub async fn run_scenario() -> ClaimfillResult<()> {
    println!("=== Scenario 3: Repair Conversation ===");
    println!();

    let journal = Arc::new(InMemoryJournal::new());
    let (conversation, case_id) = converse(Arc::clone(&journal)).await?;

    for (message, outcome) in [
        (VAGUE_REPLY, &conversation.vague),
        (FULL_REPLY, &conversation.full),
        (QUESTION, &conversation.question),
    ] {
        println!("  Claimant:  {message}");
        println!("  Assistant: {}", reply_text(outcome).lines().next().unwrap_or_default());
        println!("  Phase:     {:?} ({} missing)", outcome.phase, outcome.missing_keys.len());
        println!();
    }

    println!("  Refreshed summary: {}", conversation.summary);
    println!();
    println!(
        "  Journal integrity: {} ({} seal(s))",
        if journal.verify_integrity(&case_id) { "VERIFIED" } else { "FAILED" },
        journal.export(&case_id).map(|j| j.seals.len()).unwrap_or_default()
    );
    println!();
    println!("  Scenario 3 complete.");
    println!();

    Ok(())
}
