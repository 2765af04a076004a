//! Capability traits for the claimfill pipeline.
//!
//! These four traits are the pipeline's only contact with the outside world:
//!
//! - `ModelClient`    — the opaque language-model call (untrusted output)
//! - `DocumentReader` — raw text from a source file
//! - `JournalWriter`  — append-only record of every stage transition
//! - `Verifier`       — deterministic checks on the working record
//!
//! The orchestrator wires them together. Everything else it does is pure
//! data transformation.

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use claimfill_contracts::{
    error::ClaimfillResult,
    model::{ModelError, ModelReply, ModelRequest},
    pipeline::StageRecord,
    verify::{RecordSchema, VerificationReport},
};

/// The single model capability every model-backed stage is built on.
///
/// Implementations are considered **untrusted**: replies are parsed and
/// shape-checked by the stage adapters before anything reaches the record.
/// Test doubles typically dispatch on `request.stage`.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send one request and wait for the reply.
    async fn invoke(&self, request: &ModelRequest) -> Result<ModelReply, ModelError>;
}

/// Produces the raw text of one source document.
///
/// Failures are absorbed per document: the orchestrator records the error on
/// the unit and carries on with the rest.
#[async_trait]
pub trait DocumentReader: Send + Sync {
    async fn read(&self, path: &Path) -> ClaimfillResult<String>;
}

/// The case journal: the immutable record of a run.
///
/// Every stage transition, successful or not, produces exactly one
/// `StageRecord`. A failed write is fatal: the orchestrator stops and
/// returns `ClaimfillError::JournalWriteFailed`.
pub trait JournalWriter: Send + Sync {
    /// Append one record to the journal of `case_id`.
    ///
    /// Implementations must treat this as an append-only operation.
    fn write(&self, case_id: &str, record: &StageRecord) -> ClaimfillResult<()>;

    /// Mark one pipeline run or repair iteration of `case_id` as finished.
    ///
    /// Implementations may use this to flush, sign, or seal the journal.
    fn finalize(&self, case_id: &str) -> ClaimfillResult<()>;
}

/// Deterministic record checks.
///
/// Implementations are **trusted** and must not call the model. A failing
/// report never blocks the pipeline; findings are surfaced as advisory text.
pub trait Verifier: Send + Sync {
    /// Verify `record` against `schema`.
    ///
    /// Return a `VerificationReport` with `passed = true` if all rules pass,
    /// or `passed = false` with populated `failures` if any rule fails.
    fn verify(&self, record: &Value, schema: &RecordSchema) -> ClaimfillResult<VerificationReport>;
}
