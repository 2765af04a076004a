//! Model-backed stage adapters.
//!
//! Each method binds one instruction template and one expected output shape
//! to the single `ModelClient::invoke` capability. Adapters do not decide
//! what a failure means for the run; they return it and the orchestrator
//! applies the stage's failure policy.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use claimfill_config::InstructionSet;
use claimfill_contracts::{
    case::{CaseAnalysis, ChatMessage, ChatRole},
    document::DocumentUnit,
    error::{ClaimfillError, ClaimfillResult},
    model::{ModelError, ModelReply, ModelRequest, Stage},
    pipeline::{FlatPatch, Reconstruction},
};

use crate::{
    parse::{expect_object, expect_text, parse_json},
    traits::ModelClient,
};

pub struct Stages {
    client: Arc<dyn ModelClient>,
    instructions: InstructionSet,
    /// Pretty-printed schema template, handed to stages that fill it.
    template_text: String,
}

impl Stages {
    pub fn new(client: Arc<dyn ModelClient>, instructions: InstructionSet, template: &Value) -> Self {
        let template_text =
            serde_json::to_string_pretty(template).unwrap_or_else(|_| template.to_string());
        Self { client, instructions, template_text }
    }

    async fn call(
        &self,
        stage: Stage,
        instructions: String,
        messages: Vec<ChatMessage>,
    ) -> Result<ModelReply, ModelError> {
        let request = ModelRequest { stage, instructions, messages };
        debug!(stage = %stage, messages = request.messages.len(), "invoking model");
        self.client.invoke(&request).await
    }

    async fn call_text(
        &self,
        stage: Stage,
        instructions: String,
        messages: Vec<ChatMessage>,
    ) -> ClaimfillResult<String> {
        let reply = self
            .call(stage, instructions, messages)
            .await
            .map_err(|e| ClaimfillError::model(stage, e))?;
        expect_text(stage, reply)
    }

    async fn call_object(
        &self,
        stage: Stage,
        instructions: String,
        messages: Vec<ChatMessage>,
    ) -> ClaimfillResult<serde_json::Map<String, Value>> {
        let reply = self
            .call(stage, instructions, messages)
            .await
            .map_err(|e| ClaimfillError::model(stage, e))?;
        expect_object(stage, reply)
    }

    // ── Document pipeline ─────────────────────────────────────────────────────

    /// Describer: raw text → legal-professional summary.
    pub async fn describe(&self, unit: &DocumentUnit) -> ClaimfillResult<String> {
        let text = unit.raw_text.as_deref().unwrap_or_default();
        self.call_text(
            Stage::Describe,
            self.instructions.render(Stage::Describe, &[]),
            vec![ChatMessage::user(text)],
        )
        .await
    }

    /// Classifier: narrative + document descriptions → case summary and a
    /// party label per document.
    pub async fn classify(&self, user_claim: &str, documents_md: &str) -> ClaimfillResult<CaseAnalysis> {
        let map = self
            .call_object(
                Stage::Classify,
                self.instructions.render(Stage::Classify, &[("user_claim", user_claim)]),
                vec![ChatMessage::user(documents_md)],
            )
            .await?;
        serde_json::from_value(Value::Object(map)).map_err(|e| ClaimfillError::SchemaMismatch {
            stage: Stage::Classify,
            reason: e.to_string(),
        })
    }

    /// Extractor: one document → object fragment of the template.
    pub async fn extract(
        &self,
        unit: &DocumentUnit,
        case_summary: &str,
        user_claim: &str,
    ) -> ClaimfillResult<Value> {
        let classification = unit
            .classification
            .as_ref()
            .map(|c| c.label.as_str())
            .unwrap_or("unclassified");
        let description = unit.description.as_deref().unwrap_or_default();
        let instructions = self.instructions.render(
            Stage::Extract,
            &[
                ("case_summary", case_summary),
                ("classification", classification),
                ("user_claim", user_claim),
                ("document_description", description),
            ],
        );
        let messages = vec![
            ChatMessage::system(format!("JSON template:\n{}", self.template_text)),
            ChatMessage::user(unit.raw_text.as_deref().unwrap_or_default()),
        ];
        self.call_object(Stage::Extract, instructions, messages).await.map(Value::Object)
    }

    /// Combiner: described and labelled fragments → one record.
    pub async fn combine(&self, fragments_md: &str, case_summary: &str) -> ClaimfillResult<Value> {
        let messages = vec![
            ChatMessage::system(format!("JSON template:\n{}", self.template_text)),
            ChatMessage::user(fragments_md),
        ];
        self.call_object(
            Stage::Combine,
            self.instructions.render(Stage::Combine, &[("case_summary", case_summary)]),
            messages,
        )
        .await
        .map(Value::Object)
    }

    /// Reviser: missing keys + every document's text → flat patch.
    pub async fn revise(&self, missing_keys: &[String], corpus_md: &str) -> ClaimfillResult<FlatPatch> {
        let keys = missing_keys.join("\n");
        self.call_object(
            Stage::Revise,
            self.instructions.render(Stage::Revise, &[("missing_keys", &keys)]),
            vec![ChatMessage::user(corpus_md)],
        )
        .await
    }

    // ── Audit evaluators ──────────────────────────────────────────────────────

    pub async fn conflict_audit(&self, user_claim: &str, documents_md: &str) -> ClaimfillResult<String> {
        self.call_text(
            Stage::ConflictAudit,
            self.instructions
                .render(Stage::ConflictAudit, &[("document_descriptions", documents_md)]),
            vec![ChatMessage::user(user_claim)],
        )
        .await
    }

    /// Claim-value evaluator: the account's breakdown against the claimed
    /// total, read alongside the case summary.
    pub async fn claim_value_audit(
        &self,
        user_claim: &str,
        claim_value: &str,
        case_summary: &str,
    ) -> ClaimfillResult<String> {
        self.call_text(
            Stage::ClaimValueAudit,
            self.instructions.render(
                Stage::ClaimValueAudit,
                &[("claim_value", claim_value), ("case_summary", case_summary)],
            ),
            vec![ChatMessage::user(user_claim)],
        )
        .await
    }

    pub async fn required_documents(&self, user_claim: &str, documents_md: &str) -> ClaimfillResult<String> {
        self.call_text(
            Stage::RequiredDocuments,
            self.instructions
                .render(Stage::RequiredDocuments, &[("document_descriptions", documents_md)]),
            vec![ChatMessage::user(user_claim)],
        )
        .await
    }

    /// Uploaded documents the account never refers to.
    pub async fn unreferenced_documents(&self, user_claim: &str, documents_md: &str) -> ClaimfillResult<String> {
        self.call_text(
            Stage::UnreferencedDocuments,
            self.instructions
                .render(Stage::UnreferencedDocuments, &[("document_descriptions", documents_md)]),
            vec![ChatMessage::user(user_claim)],
        )
        .await
    }

    // ── Repair loop ───────────────────────────────────────────────────────────

    /// Reconstructor: free-text chat reply → flat patch.
    ///
    /// Never fails. When the model is unavailable or its reply does not
    /// parse as an object, the reply (or failure text) comes back as a
    /// diagnostic for the user to read.
    pub async fn reconstruct(
        &self,
        user_message: &str,
        missing_keys: &[String],
        all_keys: &[String],
        history: &[ChatMessage],
    ) -> Reconstruction {
        let missing = missing_keys.join("\n");
        let all = all_keys.join("\n");
        let instructions = self
            .instructions
            .render(Stage::Reconstruct, &[("missing_keys", &missing), ("all_keys", &all)]);

        let mut messages = history.to_vec();
        messages.push(ChatMessage::user(user_message));

        let text = match self.call(Stage::Reconstruct, instructions, messages).await {
            Ok(ModelReply::Structured(Value::Object(map))) => return Reconstruction::Patch(map),
            Ok(reply) => reply.into_text(),
            Err(ModelError::Unparsable { raw, .. }) => return Reconstruction::Diagnostic(raw),
            Err(e) => return Reconstruction::Diagnostic(e.to_string()),
        };

        match parse_json(&text) {
            Ok(Value::Object(map)) => Reconstruction::Patch(map),
            Err(ModelError::Empty) => Reconstruction::Diagnostic(ModelError::Empty.to_string()),
            _ => Reconstruction::Diagnostic(text),
        }
    }

    /// Free conversation once nothing is missing.
    ///
    /// `history` already ends with the user's latest message.
    pub async fn converse(&self, case_summary: &str, history: &[ChatMessage]) -> ClaimfillResult<String> {
        self.call_text(
            Stage::Converse,
            self.instructions.render(Stage::Converse, &[("case_summary", case_summary)]),
            history.to_vec(),
        )
        .await
    }

    /// Checker: asks for whatever is still missing, continuing `history`.
    pub async fn checker(&self, missing_keys: &[String], history: &[ChatMessage]) -> ClaimfillResult<String> {
        let keys = missing_keys.join("\n");
        let mut messages = history.to_vec();
        if messages.last().map_or(true, |m| m.role != ChatRole::User) {
            messages.push(ChatMessage::user("Please help me complete my claim form."));
        }
        self.call_text(
            Stage::Checker,
            self.instructions.render(Stage::Checker, &[("missing_keys", &keys)]),
            messages,
        )
        .await
    }

    /// Regenerate the case summary from the record and the conversation.
    pub async fn summarize(&self, record_md: &str, history: &[ChatMessage]) -> ClaimfillResult<String> {
        let mut messages = vec![ChatMessage::system(format!("Current record:\n{record_md}"))];
        messages.extend(history.iter().cloned());
        self.call_text(Stage::Summarize, self.instructions.render(Stage::Summarize, &[]), messages)
            .await
    }
}
