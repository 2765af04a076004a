//! Error taxonomy for the claimfill pipeline.
//!
//! All fallible case-level operations return `ClaimfillResult<T>`. Errors
//! scoped to a single document never surface here; they are recorded on the
//! owning `DocumentUnit` instead and the run continues.

use thiserror::Error;

use crate::model::{ModelError, Stage};

/// The unified error type for the claimfill runtime.
#[derive(Debug, Error)]
pub enum ClaimfillError {
    /// A source document could not be read or decoded.
    ///
    /// Raised by `DocumentReader` implementations. The orchestrator absorbs it
    /// into the unit's `error` field; it only propagates from direct reader calls.
    #[error("failed to read document '{path}': {reason}")]
    Ingestion { path: String, reason: String },

    /// An external model call failed for a stage that has no fallback.
    #[error("model call failed during {stage}: {source}")]
    Model {
        stage: Stage,
        #[source]
        source: ModelError,
    },

    /// A stage reply parsed, but not as the container the stage requires.
    #[error("{stage} output does not match the expected shape: {reason}")]
    SchemaMismatch { stage: Stage, reason: String },

    /// Every document failed before Combine, so there is nothing to merge.
    #[error("no document produced a usable fragment; nothing to combine")]
    NoUsableDocuments,

    /// The schema template violates the template invariants.
    #[error("invalid schema template: {reason}")]
    InvalidTemplate { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// The case journal could not record a stage transition.
    ///
    /// Fatal: a transition that cannot be journaled does not proceed.
    #[error("journal write failed: {reason}")]
    JournalWriteFailed { reason: String },
}

impl ClaimfillError {
    /// Wrap a `ModelError` raised while running `stage`.
    pub fn model(stage: Stage, source: ModelError) -> Self {
        Self::Model { stage, source }
    }

    /// True for errors that the caller may reasonably retry as a whole case.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Model { source: ModelError::Unavailable { .. }, .. }
                | Self::Model { source: ModelError::Empty, .. }
        )
    }
}

/// Convenience alias used throughout the claimfill crates.
pub type ClaimfillResult<T> = Result<T, ClaimfillError>;
