//! Pipeline and repair-loop results, and the journal record type.
//!
//! `ProcessOutcome` and `RepairOutcome` are what the orchestrator returns to
//! the session layer. `StageRecord` is what gets written to the case journal,
//! one per stage transition.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::DocumentUnit;

/// A dotted-path → value mapping to be merged into a nested record.
///
/// Insertion order is preserved and is the order of injection.
pub type FlatPatch = Map<String, Value>;

/// States of the document pipeline, in strict dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Ingest,
    Describe,
    Classify,
    Extract,
    Combine,
    Diff,
    Revise,
    Inject,
    Verify,
    Audit,
    Complete,
}

/// States of one repair-loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairPhase {
    AwaitingInput,
    Conversing,
    Reconstructing,
    Injecting,
    Diffing,
    MoreMissing,
    Complete,
}

/// What a journaled transition is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "state")]
pub enum JournalPhase {
    Pipeline(PipelineStage),
    Repair(RepairPhase),
}

impl fmt::Display for JournalPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pipeline(stage) => write!(f, "pipeline:{stage:?}"),
            Self::Repair(phase) => write!(f, "repair:{phase:?}"),
        }
    }
}

/// How a journaled transition ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    Completed,
    /// Finished, but some documents or evaluators failed along the way.
    Degraded { reason: String },
    /// Aborted the run.
    Failed { reason: String },
    Skipped,
}

/// An immutable record of one transition, written to the case journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub phase: JournalPhase,
    pub outcome: StageOutcome,
    /// Size of the missing-key list after this transition, when known.
    pub missing_count: Option<usize>,
    /// Stage-specific counters and identifiers.
    pub detail: Value,
    pub timestamp: DateTime<Utc>,
}

impl StageRecord {
    pub fn new(phase: JournalPhase, outcome: StageOutcome, detail: Value) -> Self {
        Self { phase, outcome, missing_count: None, detail, timestamp: Utc::now() }
    }

    pub fn with_missing(mut self, missing_count: usize) -> Self {
        self.missing_count = Some(missing_count);
        self
    }
}

/// Summary flags the session layer can branch on without parsing text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseFlags {
    pub documents_total: usize,
    pub documents_failed: usize,
    pub conflicts_detected: bool,
    pub claim_value_conflict: bool,
    pub missing_documents: bool,
    pub unreferenced_documents: bool,
    /// Number of structural or rule findings from record verification.
    pub schema_findings: usize,
    pub complete: bool,
}

/// Result of one full document pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOutcome {
    pub record: Value,
    pub missing_keys: Vec<String>,
    /// Audit and verification notes for the claimant.
    pub advisory: String,
    pub flags: CaseFlags,
    /// Every unit, failed ones included, in input order. The narrative unit
    /// is listed last.
    pub documents: Vec<DocumentUnit>,
    pub case_summary: String,
    pub document_digest: String,
}

/// What the Reconstructor made of a chat reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconstruction {
    /// A usable patch for the injector.
    Patch(FlatPatch),
    /// The reply could not be turned into a patch; surface this text verbatim.
    Diagnostic(String),
}

/// What the user should see after one repair iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RepairReply {
    /// The record was patched. `filled` lists the patch paths applied.
    Updated { filled: Vec<String> },
    /// Reconstruction failed; the record is untouched.
    Diagnostic(String),
    /// Nothing was missing, so the message went to free conversation.
    Conversation(String),
}

/// Result of one repair-loop iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairOutcome {
    pub record: Value,
    pub missing_keys: Vec<String>,
    pub reply: RepairReply,
    pub phase: RepairPhase,
}
