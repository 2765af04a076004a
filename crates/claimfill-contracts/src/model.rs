//! The opaque model-call surface.
//!
//! Every model-backed stage is a thin adapter over a single capability:
//! `invoke(request) -> Result<ModelReply, ModelError>`. The request names the
//! stage, carries the rendered instructions, and the conversation turns the
//! stage wants the model to see.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::case::ChatMessage;

/// The model-backed stages of the pipeline and the repair loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Describe,
    Classify,
    Extract,
    Combine,
    Revise,
    ConflictAudit,
    ClaimValueAudit,
    RequiredDocuments,
    UnreferencedDocuments,
    Reconstruct,
    Converse,
    Checker,
    Summarize,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Describe => "describe",
            Self::Classify => "classify",
            Self::Extract => "extract",
            Self::Combine => "combine",
            Self::Revise => "revise",
            Self::ConflictAudit => "conflict_audit",
            Self::ClaimValueAudit => "claim_value_audit",
            Self::RequiredDocuments => "required_documents",
            Self::UnreferencedDocuments => "unreferenced_documents",
            Self::Reconstruct => "reconstruct",
            Self::Converse => "converse",
            Self::Checker => "checker",
            Self::Summarize => "summarize",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One call to the external model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRequest {
    /// Which stage issued the call. Adapters and test doubles dispatch on it.
    pub stage: Stage,
    /// Rendered system instructions for this stage.
    pub instructions: String,
    /// Context turns, in order. System turns carry schema text or key lists;
    /// user turns carry document text or the chat reply.
    pub messages: Vec<ChatMessage>,
}

impl ModelRequest {
    /// Concatenate the content of every message, newline separated.
    pub fn joined_content(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// What the model handed back.
///
/// Some transports return parsed JSON directly; most return text that the
/// stage adapter must parse itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelReply {
    Text(String),
    Structured(Value),
}

impl ModelReply {
    /// Render the reply as text, serialising structured replies compactly.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Structured(value) => value.to_string(),
        }
    }
}

/// Failure of a single external model call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// The transport could not produce a response (timeout, refusal, outage).
    #[error("model unavailable: {reason}")]
    Unavailable { reason: String },

    /// A response arrived but could not be parsed into the expected output.
    ///
    /// `raw` keeps the response so fallbacks can surface it verbatim.
    #[error("unparsable model output: {reason}")]
    Unparsable { reason: String, raw: String },

    /// The model answered with nothing.
    #[error("model returned an empty response")]
    Empty,
}
