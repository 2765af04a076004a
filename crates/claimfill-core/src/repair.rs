//! The interactive repair loop and the single-writer case session.
//!
//! One repair iteration takes the user's free-text reply, asks the
//! Reconstructor for a flat patch, injects it, and recomputes what is still
//! missing. When nothing is missing the message goes to free conversation
//! instead.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{info, warn};

use claimfill_contracts::{
    case::{CaseState, ChatMessage},
    error::ClaimfillResult,
    pipeline::{
        FlatPatch, JournalPhase, ProcessOutcome, Reconstruction, RepairOutcome, RepairPhase,
        RepairReply, StageOutcome, StageRecord,
    },
};
use claimfill_schema::{find_missing, inject, resolve, walker};

use crate::orchestrator::{move_to_front, Pipeline};

/// True when `patch` names `path` and the record now holds a value there
/// that the missing-key walk counts as filled.
pub fn is_claim_value_updated(patch: &FlatPatch, record: &Value, path: &str) -> bool {
    if !patch.contains_key(path) {
        return false;
    }
    resolve(record, path).is_some_and(|v| !walker::is_unfilled_scalar(v))
}

impl Pipeline {
    /// Run one repair iteration against `state`.
    ///
    /// `state` is not modified; the updated record and missing list come back
    /// in the outcome. A reply the Reconstructor cannot turn into a patch
    /// leaves the record untouched and is surfaced as a diagnostic.
    pub async fn repair(&self, state: &CaseState, user_message: &str) -> ClaimfillResult<RepairOutcome> {
        let case_id = state.case_id.as_str();
        self.journal_repair(case_id, RepairPhase::AwaitingInput, StageOutcome::Completed, json!({}), None)?;

        if state.missing_keys.is_empty() {
            let mut turns = state.chat_history.clone();
            turns.push(ChatMessage::user(user_message));
            let reply = self.stages.converse(&state.case_summary, &turns).await?;
            self.journal_repair(case_id, RepairPhase::Conversing, StageOutcome::Completed, Value::Null, Some(0))?;
            self.journal.finalize(case_id)?;
            return Ok(RepairOutcome {
                record: state.record.clone(),
                missing_keys: Vec::new(),
                reply: RepairReply::Conversation(reply),
                phase: RepairPhase::Complete,
            });
        }

        let reconstruction = self
            .stages
            .reconstruct(user_message, &state.missing_keys, &self.all_keys, &state.chat_history)
            .await;

        let patch = match reconstruction {
            Reconstruction::Patch(patch) => patch,
            Reconstruction::Diagnostic(text) => {
                warn!(case_id = %case_id, "reply could not be reconstructed into a patch");
                self.journal_repair(
                    case_id,
                    RepairPhase::Reconstructing,
                    StageOutcome::Degraded { reason: "reply did not yield a patch".to_string() },
                    Value::Null,
                    Some(state.missing_keys.len()),
                )?;
                self.journal.finalize(case_id)?;
                return Ok(RepairOutcome {
                    record: state.record.clone(),
                    missing_keys: state.missing_keys.clone(),
                    reply: RepairReply::Diagnostic(text),
                    phase: RepairPhase::AwaitingInput,
                });
            }
        };
        let filled: Vec<String> = patch.keys().cloned().collect();
        self.journal_repair(
            case_id,
            RepairPhase::Reconstructing,
            StageOutcome::Completed,
            json!({ "patched": filled.len() }),
            None,
        )?;

        let record = inject(&patch, &state.record);
        self.journal_repair(case_id, RepairPhase::Injecting, StageOutcome::Completed, json!({ "paths": filled }), None)?;

        let mut missing = find_missing(&self.template, &record, "");
        let claim_path = self.settings.claim_value_path.as_str();
        if state.missing_keys.iter().any(|k| k == claim_path)
            && !is_claim_value_updated(&patch, &record, claim_path)
        {
            move_to_front(&mut missing, claim_path);
        }
        self.journal_repair(case_id, RepairPhase::Diffing, StageOutcome::Completed, Value::Null, Some(missing.len()))?;

        let phase = if missing.is_empty() { RepairPhase::Complete } else { RepairPhase::MoreMissing };
        self.journal_repair(case_id, phase, StageOutcome::Completed, Value::Null, Some(missing.len()))?;
        self.journal.finalize(case_id)?;

        info!(case_id = %case_id, filled = filled.len(), missing = missing.len(), "repair iteration complete");

        Ok(RepairOutcome { record, missing_keys: missing, reply: RepairReply::Updated { filled }, phase })
    }

    /// Regenerate the case summary from the current record and conversation.
    pub async fn refresh_summary(&self, state: &CaseState) -> ClaimfillResult<String> {
        let record_md = self.record_markdown(&state.record);
        self.stages.summarize(&record_md, &state.chat_history).await
    }

    /// The assistant's next turn in the conversation held in `state`.
    ///
    /// Asks for what is still missing through the Checker, or talks freely
    /// through Converse once the record is complete.
    pub async fn follow_up(&self, state: &CaseState) -> ClaimfillResult<String> {
        if state.missing_keys.is_empty() {
            self.stages.converse(&state.case_summary, &state.chat_history).await
        } else {
            self.stages.checker(&state.missing_keys, &state.chat_history).await
        }
    }

    fn journal_repair(
        &self,
        case_id: &str,
        phase: RepairPhase,
        outcome: StageOutcome,
        detail: Value,
        missing: Option<usize>,
    ) -> ClaimfillResult<()> {
        let mut record = StageRecord::new(JournalPhase::Repair(phase), outcome, detail);
        record.missing_count = missing;
        self.journal.write(case_id, &record)
    }
}

/// Text to show the user for one repair outcome.
pub fn reply_text(outcome: &RepairOutcome) -> String {
    match &outcome.reply {
        RepairReply::Conversation(text) | RepairReply::Diagnostic(text) => text.clone(),
        RepairReply::Updated { filled } if outcome.missing_keys.is_empty() => {
            format!("Updated {}. The record is now complete.", filled.join(", "))
        }
        RepairReply::Updated { filled } => format!(
            "Updated {}. Still missing:\n- {}",
            if filled.is_empty() { "nothing".to_string() } else { filled.join(", ") },
            outcome.missing_keys.join("\n- ")
        ),
    }
}

fn missing_status(missing: &[String]) -> String {
    if missing.is_empty() {
        "No other missing keys found.".to_string()
    } else {
        format!("Updated missing keys:\n{}", missing.join("\n"))
    }
}

/// One case, one writer.
///
/// Holds the case state behind an async mutex for the whole of each call, so
/// a pipeline run and a repair iteration on the same case never interleave.
pub struct CaseSession {
    pipeline: Arc<Pipeline>,
    state: Mutex<CaseState>,
}

impl CaseSession {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        let mut state = CaseState::new();
        state.all_keys = pipeline.all_keys().to_vec();
        state.missing_keys = state.all_keys.clone();
        Self { pipeline, state: Mutex::new(state) }
    }

    pub async fn case_id(&self) -> String {
        self.state.lock().await.case_id.clone()
    }

    /// Run the document pipeline and adopt its result.
    ///
    /// On error the previous state is kept as it was.
    pub async fn process(&self, narrative: &str, paths: &[PathBuf]) -> ClaimfillResult<ProcessOutcome> {
        let mut state = self.state.lock().await;
        let outcome = self.pipeline.process_case(&state.case_id, narrative, paths).await?;

        state.record = outcome.record.clone();
        state.missing_keys = outcome.missing_keys.clone();
        state.case_summary = outcome.case_summary.clone();
        state.document_digest = outcome.document_digest.clone();

        state.chat_history.push(ChatMessage::system(format!(
            "Missing keys:\n{}",
            outcome.missing_keys.join("\n")
        )));
        if !outcome.advisory.is_empty() {
            state.chat_history.push(ChatMessage::system(outcome.advisory.clone()));
        }
        let follow_up = self.pipeline.follow_up(&state).await;
        match follow_up {
            Ok(text) => state.chat_history.push(ChatMessage::assistant(text)),
            Err(e) => warn!(case_id = %state.case_id, error = %e, "follow-up message unavailable"),
        }

        Ok(outcome)
    }

    /// Run one repair iteration and adopt its result.
    ///
    /// After a patch, the updated missing keys go into the history as a
    /// system turn and the model writes the assistant's reply. `reply_text`
    /// stands in when that call fails.
    pub async fn repair(&self, user_message: &str) -> ClaimfillResult<RepairOutcome> {
        let mut state = self.state.lock().await;
        let outcome = self.pipeline.repair(&state, user_message).await?;

        state.record = outcome.record.clone();
        state.missing_keys = outcome.missing_keys.clone();
        state.chat_history.push(ChatMessage::user(user_message));

        let reply = match &outcome.reply {
            RepairReply::Updated { .. } => {
                state.chat_history.push(ChatMessage::system(missing_status(&outcome.missing_keys)));
                let follow_up = self.pipeline.follow_up(&state).await;
                match follow_up {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(case_id = %state.case_id, error = %e, "repair reply unavailable");
                        reply_text(&outcome)
                    }
                }
            }
            RepairReply::Conversation(_) | RepairReply::Diagnostic(_) => reply_text(&outcome),
        };
        state.chat_history.push(ChatMessage::assistant(reply));

        Ok(outcome)
    }

    pub async fn refresh_summary(&self) -> ClaimfillResult<String> {
        let mut state = self.state.lock().await;
        let summary = self.pipeline.refresh_summary(&state).await?;
        state.case_summary = summary.clone();
        Ok(summary)
    }

    pub async fn snapshot(&self) -> CaseState {
        self.state.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;

    use claimfill_contracts::{
        case::ChatRole,
        model::{ModelError, ModelReply, ModelRequest, Stage},
    };
    use claimfill_schema::find_missing;

    use crate::testing::{pipeline, structured, template, text, MapReader, RecordingJournal, ScriptedModel};

    use super::*;

    fn half_filled_state() -> CaseState {
        let mut state = CaseState::new();
        state.record = json!({
            "claimant": { "full_name": "" },
            "defendant": { "full_name": "" },
            "claim_details": { "claim_value": "", "final_orders_sought": ["Unpaid salary"] }
        });
        state.missing_keys = find_missing(&template(), &state.record, "");
        state
    }

    fn repairing(reply: fn(&ModelRequest) -> Result<ModelReply, ModelError>) -> (Pipeline, Arc<ScriptedModel>) {
        let model = ScriptedModel::new(reply);
        let pipeline = pipeline(model.clone(), MapReader::with(&[]), Arc::new(RecordingJournal::default()));
        (pipeline, model)
    }

    #[tokio::test]
    async fn unfilled_claim_value_stays_first() {
        let (pipeline, _) = repairing(|_| structured(json!({ "defendant.full_name": "Acme Trading LLC" })));
        let state = half_filled_state();
        assert_eq!(
            state.missing_keys,
            vec!["claimant.full_name", "defendant.full_name", "claim_details.claim_value"]
        );

        let outcome = pipeline.repair(&state, "The employer is Acme Trading LLC").await.unwrap();

        assert_eq!(outcome.record["defendant"]["full_name"], "Acme Trading LLC");
        assert_eq!(outcome.missing_keys, vec!["claim_details.claim_value", "claimant.full_name"]);
        assert_eq!(outcome.phase, RepairPhase::MoreMissing);
        assert_eq!(outcome.reply, RepairReply::Updated { filled: vec!["defendant.full_name".to_string()] });
    }

    #[tokio::test]
    async fn unreadable_reply_leaves_record_untouched() {
        let (pipeline, _) = repairing(|_| text("Which amount do you mean, the salary or the total?"));
        let state = half_filled_state();

        let outcome = pipeline.repair(&state, "the usual one").await.unwrap();

        assert_eq!(outcome.record, state.record);
        assert_eq!(outcome.missing_keys, state.missing_keys);
        assert_eq!(outcome.phase, RepairPhase::AwaitingInput);
        assert!(matches!(outcome.reply, RepairReply::Diagnostic(ref t) if t.starts_with("Which amount")));
    }

    #[tokio::test]
    async fn filling_everything_completes_the_case() {
        let (pipeline, model) = repairing(|_| {
            text(
                "```json\n{\"claimant.full_name\": \"Jane Roe\", \"defendant.full_name\": \"Acme\", \
                 \"claim_details.claim_value\": \"AED 407,174.85\"}\n```",
            )
        });
        let outcome = pipeline.repair(&half_filled_state(), "all of it").await.unwrap();

        assert!(outcome.missing_keys.is_empty());
        assert_eq!(outcome.phase, RepairPhase::Complete);
        assert_eq!(model.calls(Stage::Reconstruct), 1);
        assert_eq!(reply_text(&outcome), "Updated claimant.full_name, defendant.full_name, claim_details.claim_value. The record is now complete.");
    }

    #[tokio::test]
    async fn complete_case_goes_to_conversation() {
        let (pipeline, model) = repairing(|r| match r.stage {
            Stage::Converse => text("Your hearing date will be set by the court."),
            _ => text("unexpected"),
        });
        let mut state = half_filled_state();
        state.missing_keys.clear();

        let outcome = pipeline.repair(&state, "What happens next?").await.unwrap();

        assert_eq!(model.calls(Stage::Reconstruct), 0);
        assert_eq!(outcome.phase, RepairPhase::Complete);
        assert_eq!(
            outcome.reply,
            RepairReply::Conversation("Your hearing date will be set by the court.".to_string())
        );
    }

    #[test]
    fn claim_value_update_detection() {
        let path = "claim_details.claim_value";
        let record = json!({ "claim_details": { "claim_value": "AED 1,000.00" } });

        let mut patch = FlatPatch::new();
        assert!(!is_claim_value_updated(&patch, &record, path));

        patch.insert(path.to_string(), json!("AED 1,000.00"));
        assert!(is_claim_value_updated(&patch, &record, path));

        let blank = json!({ "claim_details": { "claim_value": "" } });
        assert!(!is_claim_value_updated(&patch, &blank, path));

        // Zero is a value, as it is for the missing-key walk.
        let zero = json!({ "claim_details": { "claim_value": 0 } });
        assert!(is_claim_value_updated(&patch, &zero, path));
    }

    #[tokio::test]
    async fn zero_claim_value_is_not_asked_for_again() {
        let (pipeline, _) = repairing(|_| structured(json!({ "claim_details.claim_value": 0 })));
        let state = half_filled_state();

        let outcome = pipeline.repair(&state, "I am not claiming any money").await.unwrap();

        assert_eq!(outcome.missing_keys, vec!["claimant.full_name", "defendant.full_name"]);
    }

    // ── Session ──────────────────────────────────────────────────────────────

    fn session_model(request: &ModelRequest) -> Result<ModelReply, ModelError> {
        match request.stage {
            Stage::Describe => text("An employment contract."),
            Stage::Classify => structured(json!({ "case_summary": "Unpaid wages", "details": [] })),
            Stage::Extract | Stage::Combine => {
                structured(json!({ "claimant": { "full_name": "Jane Roe" } }))
            }
            Stage::Revise => structured(json!({})),
            Stage::ConflictAudit => text("<empty></empty>"),
            Stage::RequiredDocuments => text("none"),
            Stage::Checker if request.messages.iter().any(|m| m.content.starts_with("Updated missing keys:")) => {
                text("Thanks. What is the total amount you are claiming?")
            }
            Stage::Checker => text("Hello Jane, who is your employer?"),
            Stage::Reconstruct => structured(json!({ "defendant.full_name": "Acme" })),
            Stage::Summarize => text("Jane Roe claims unpaid wages from Acme."),
            _ => text("ok"),
        }
    }

    #[tokio::test]
    async fn session_adopts_results_and_keeps_history() {
        let model = ScriptedModel::new(session_model);
        let pipeline = Arc::new(pipeline(
            model,
            MapReader::with(&[("contract.md", "Contract")]),
            Arc::new(RecordingJournal::default()),
        ));
        let session = CaseSession::new(pipeline);

        let outcome = session.process("I was not paid.", &[PathBuf::from("contract.md")]).await.unwrap();
        assert_eq!(outcome.missing_keys[0], "defendant.full_name");

        let state = session.snapshot().await;
        assert_eq!(state.case_summary, "Unpaid wages");
        assert_eq!(state.chat_history.first().unwrap().role, ChatRole::System);
        assert_eq!(state.chat_history.last().unwrap().content, "Hello Jane, who is your employer?");

        session.repair("It was Acme").await.unwrap();
        let state = session.snapshot().await;
        assert_eq!(state.record["defendant"]["full_name"], "Acme");
        assert!(!state.missing_keys.contains(&"defendant.full_name".to_string()));
        let turns = state.chat_history.len();
        assert_eq!(state.chat_history[turns - 3].content, "It was Acme");
        let status = &state.chat_history[turns - 2];
        assert_eq!(status.role, ChatRole::System);
        assert_eq!(status.content, format!("Updated missing keys:\n{}", state.missing_keys.join("\n")));
        let reply = &state.chat_history[turns - 1];
        assert_eq!(reply.role, ChatRole::Assistant);
        assert_eq!(reply.content, "Thanks. What is the total amount you are claiming?");

        let summary = session.refresh_summary().await.unwrap();
        assert_eq!(session.snapshot().await.case_summary, summary);
    }

    #[tokio::test]
    async fn session_falls_back_to_a_fixed_reply_when_the_model_fails() {
        let model = ScriptedModel::new(|r| match r.stage {
            Stage::Checker if r.messages.iter().any(|m| m.content.starts_with("Updated missing keys:")) => {
                Err(ModelError::Unavailable { reason: "timeout".to_string() })
            }
            _ => session_model(r),
        });
        let pipeline = Arc::new(pipeline(
            model,
            MapReader::with(&[("contract.md", "Contract")]),
            Arc::new(RecordingJournal::default()),
        ));
        let session = CaseSession::new(pipeline);
        session.process("I was not paid.", &[PathBuf::from("contract.md")]).await.unwrap();

        let outcome = session.repair("It was Acme").await.unwrap();

        let state = session.snapshot().await;
        let reply = state.chat_history.last().unwrap();
        assert_eq!(reply.role, ChatRole::Assistant);
        assert_eq!(reply.content, reply_text(&outcome));
        assert!(reply.content.starts_with("Updated defendant.full_name."));
    }

    #[tokio::test]
    async fn completing_the_record_says_so_before_the_reply() {
        let model = ScriptedModel::new(|r| match r.stage {
            Stage::Reconstruct => structured(json!({
                "defendant.full_name": "Acme",
                "claim_details.claim_value": "AED 10,000.00",
                "claim_details.final_orders_sought": ["Unpaid salary"]
            })),
            Stage::Converse => text("Your form is complete."),
            _ => session_model(r),
        });
        let pipeline = Arc::new(pipeline(
            model.clone(),
            MapReader::with(&[("contract.md", "Contract")]),
            Arc::new(RecordingJournal::default()),
        ));
        let session = CaseSession::new(pipeline);
        session.process("I was not paid.", &[PathBuf::from("contract.md")]).await.unwrap();

        let outcome = session.repair("Acme owes me AED 10,000.00 in salary").await.unwrap();

        assert_eq!(outcome.phase, RepairPhase::Complete);
        assert_eq!(model.calls(Stage::Converse), 1);
        let state = session.snapshot().await;
        let turns = state.chat_history.len();
        assert_eq!(state.chat_history[turns - 2].content, "No other missing keys found.");
        assert_eq!(state.chat_history[turns - 1].content, "Your form is complete.");
    }

    #[tokio::test]
    async fn failed_run_keeps_previous_state() {
        let model = ScriptedModel::new(session_model);
        let pipeline = Arc::new(pipeline(model, MapReader::with(&[]), Arc::new(RecordingJournal::default())));
        let session = CaseSession::new(pipeline);
        let before = session.snapshot().await;

        assert!(session.process("I was not paid.", &[PathBuf::from("missing.pdf")]).await.is_err());

        let after = session.snapshot().await;
        assert_eq!(after.record, before.record);
        assert_eq!(after.missing_keys, before.missing_keys);
        assert!(after.chat_history.is_empty());
    }
}
