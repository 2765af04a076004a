//! Case-level state: the classifier's analysis, chat turns, and the explicit
//! `CaseState` value handed into and out of every orchestrator call.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{DocumentClassification, DocumentId, PartyLabel};

/// Speaker of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// One labelled document in the classifier's reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseDetail {
    pub document_id: DocumentId,
    pub label: PartyLabel,
    pub reason: String,
}

/// The Classify stage output: one case summary plus a label per document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseAnalysis {
    pub case_summary: String,
    #[serde(default)]
    pub details: Vec<CaseDetail>,
}

impl CaseAnalysis {
    /// Look up the classification for `id`, if the classifier labelled it.
    pub fn classification_for(&self, id: &DocumentId) -> Option<DocumentClassification> {
        self.details
            .iter()
            .find(|d| &d.document_id == id)
            .map(|d| DocumentClassification { label: d.label, reason: d.reason.clone() })
    }
}

/// Everything the session layer keeps for one case between calls.
///
/// The orchestrator never stores this itself; callers pass it in and get the
/// updated value back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseState {
    pub case_id: String,
    /// The working record. Starts as an empty object.
    pub record: Value,
    pub missing_keys: Vec<String>,
    /// Every leaf path of the template, for disambiguating user replies.
    pub all_keys: Vec<String>,
    pub case_summary: String,
    /// Markdown listing of document descriptions from the last run.
    pub document_digest: String,
    pub chat_history: Vec<ChatMessage>,
}

impl CaseState {
    /// A fresh case with a new id and an empty record.
    pub fn new() -> Self {
        Self {
            case_id: uuid::Uuid::new_v4().to_string(),
            record: Value::Object(Default::default()),
            ..Default::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.missing_keys.is_empty()
    }
}
