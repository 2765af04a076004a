//! # claimfill-contracts
//!
//! Shared types, error taxonomy, and contracts for the claimfill extraction
//! pipeline.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate — only data definitions and error types.

pub mod audit;
pub mod case;
pub mod document;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod verify;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use case::{CaseAnalysis, CaseState, ChatMessage, ChatRole};
    use document::{DocumentId, DocumentUnit, PartyLabel};
    use error::ClaimfillError;
    use model::{ModelError, ModelReply, Stage};
    use pipeline::{JournalPhase, PipelineStage, StageOutcome};

    // ── DocumentId ───────────────────────────────────────────────────────────

    #[test]
    fn document_id_has_requested_length_and_is_hex() {
        let id = DocumentId::generate(4);
        assert_eq!(id.as_str().len(), 4);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn document_id_length_is_clamped() {
        assert_eq!(DocumentId::generate(0).as_str().len(), 1);
        assert_eq!(DocumentId::generate(100).as_str().len(), 32);
    }

    // ── DocumentUnit ─────────────────────────────────────────────────────────

    #[test]
    fn narrative_unit_detected_by_file_name() {
        let unit = DocumentUnit::ingested(
            DocumentId("ab12".to_string()),
            "/tmp/case-7/claims_text.txt",
            "I was not paid".to_string(),
        );
        assert!(unit.is_narrative("claims_text.txt"));
        assert!(!unit.is_narrative("contract.pdf"));
    }

    #[test]
    fn first_failure_wins_and_clears_fragment() {
        let mut unit = DocumentUnit::ingested(
            DocumentId("ab12".to_string()),
            "contract.md",
            "text".to_string(),
        );
        unit.fragment = Some(json!({ "claimant": {} }));

        unit.fail("describe failed");
        unit.fail("extract failed");

        assert_eq!(unit.error.as_deref(), Some("describe failed"));
        assert!(unit.fragment.is_none());
        assert!(unit.is_failed());
    }

    // ── CaseAnalysis ─────────────────────────────────────────────────────────

    #[test]
    fn case_analysis_parses_and_unknown_labels_become_other() {
        let analysis: CaseAnalysis = serde_json::from_value(json!({
            "case_summary": "Unpaid wages claim",
            "details": [
                { "document_id": "a1b2", "label": "claimant", "reason": "payslip" },
                { "document_id": "c3d4", "label": "witness", "reason": "statement" }
            ]
        }))
        .unwrap();

        let first = analysis.classification_for(&DocumentId("a1b2".to_string())).unwrap();
        assert_eq!(first.label, PartyLabel::Claimant);

        let second = analysis.classification_for(&DocumentId("c3d4".to_string())).unwrap();
        assert_eq!(second.label, PartyLabel::Other);

        assert!(analysis.classification_for(&DocumentId("zzzz".to_string())).is_none());
    }

    #[test]
    fn case_analysis_details_default_to_empty() {
        let analysis: CaseAnalysis =
            serde_json::from_value(json!({ "case_summary": "s" })).unwrap();
        assert!(analysis.details.is_empty());
    }

    // ── CaseState ────────────────────────────────────────────────────────────

    #[test]
    fn new_case_state_starts_with_empty_object_record() {
        let state = CaseState::new();
        assert_eq!(state.record, json!({}));
        assert!(state.is_complete());
        assert!(!state.case_id.is_empty());
    }

    #[test]
    fn chat_message_roles_serialize_lowercase() {
        let msg = ChatMessage::assistant("hello");
        assert_eq!(msg.role, ChatRole::Assistant);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "assistant");
    }

    // ── ModelReply ───────────────────────────────────────────────────────────

    #[test]
    fn structured_reply_renders_as_compact_json() {
        let reply = ModelReply::Structured(json!({ "a": 1 }));
        assert_eq!(reply.into_text(), r#"{"a":1}"#);
    }

    // ── JournalPhase ─────────────────────────────────────────────────────────

    #[test]
    fn journal_phase_serializes_with_kind_tag() {
        let phase = JournalPhase::Pipeline(PipelineStage::Combine);
        let json = serde_json::to_value(phase).unwrap();
        assert_eq!(json, json!({ "kind": "pipeline", "state": "combine" }));
    }

    #[test]
    fn stage_outcome_failed_carries_reason() {
        let outcome = StageOutcome::Failed { reason: "combine unparsable".to_string() };
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("combine unparsable"));
    }

    // ── ClaimfillError display messages ──────────────────────────────────────

    #[test]
    fn error_model_display_names_stage() {
        let err = ClaimfillError::model(
            Stage::Combine,
            ModelError::Unavailable { reason: "timeout".to_string() },
        );
        let msg = err.to_string();
        assert!(msg.contains("combine"));
        assert!(msg.contains("timeout"));
        assert!(err.is_retryable());
    }

    #[test]
    fn error_schema_mismatch_display() {
        let err = ClaimfillError::SchemaMismatch {
            stage: Stage::Revise,
            reason: "expected a JSON object, found array".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("revise"));
        assert!(msg.contains("expected a JSON object"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn error_ingestion_display() {
        let err = ClaimfillError::Ingestion {
            path: "scan.pdf".to_string(),
            reason: "not UTF-8".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("scan.pdf"));
        assert!(msg.contains("not UTF-8"));
    }

    #[test]
    fn error_invalid_template_display() {
        let err = ClaimfillError::InvalidTemplate {
            reason: "array at 'a' is empty".to_string(),
        };
        assert!(err.to_string().contains("invalid schema template"));
    }
}
