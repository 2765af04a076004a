//! Document identity and per-document pipeline state.
//!
//! A `DocumentUnit` is created by the ingestor and filled in by Describe,
//! the Classify lookup, and Extract, in that order. Once Combine has consumed
//! it, nothing writes to it again.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Short, run-unique identifier for one ingested document.
///
/// Cut from a v4 UUID so the model can echo it back in classification
/// output without mangling it. Example: DocumentId("3fa9")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl DocumentId {
    /// Create an identifier of `len` lowercase hex characters (clamped to 1..=32).
    pub fn generate(len: usize) -> Self {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        let len = len.clamp(1, hex.len());
        Self(hex[..len].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which side of the dispute a document supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyLabel {
    Claimant,
    Defendant,
    /// Anything the classifier returned that is not one of the two parties.
    #[serde(other)]
    Other,
}

impl PartyLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Claimant => "claimant",
            Self::Defendant => "defendant",
            Self::Other => "other",
        }
    }
}

/// The label the classifier gave one document, with its rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentClassification {
    pub label: PartyLabel,
    pub reason: String,
}

/// One document moving through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentUnit {
    pub id: DocumentId,
    pub source_path: PathBuf,
    /// Extracted text, `None` when ingestion failed.
    pub raw_text: Option<String>,
    /// Set when any stage failed for this unit. Later stages skip it.
    pub error: Option<String>,
    pub description: Option<String>,
    pub classification: Option<DocumentClassification>,
    /// Partial record derived from this document alone.
    pub fragment: Option<Value>,
}

impl DocumentUnit {
    /// A unit whose text was read successfully.
    pub fn ingested(id: DocumentId, source_path: impl Into<PathBuf>, raw_text: String) -> Self {
        Self {
            id,
            source_path: source_path.into(),
            raw_text: Some(raw_text),
            error: None,
            description: None,
            classification: None,
            fragment: None,
        }
    }

    /// A unit whose ingestion failed. It is still counted and reported.
    pub fn failed(id: DocumentId, source_path: impl Into<PathBuf>, error: impl Into<String>) -> Self {
        Self {
            id,
            source_path: source_path.into(),
            raw_text: None,
            error: Some(error.into()),
            description: None,
            classification: None,
            fragment: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Record a stage failure. The first error wins; later ones are ignored.
    pub fn fail(&mut self, error: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(error.into());
        }
        self.fragment = None;
    }

    /// File name of the source, used to spot the narrative sentinel.
    pub fn file_name(&self) -> Option<&str> {
        self.source_path.file_name().and_then(|n| n.to_str())
    }

    /// True when this unit carries the user's free-text narrative.
    pub fn is_narrative(&self, sentinel: &str) -> bool {
        self.file_name() == Some(sentinel)
    }

    pub fn source(&self) -> &Path {
        &self.source_path
    }
}
