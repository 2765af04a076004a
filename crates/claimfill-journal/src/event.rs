//! Journal event and export types.
//!
//! `JournalEvent` is a single entry in a case's hash chain: it wraps a
//! `StageRecord` with sequence numbering and the SHA-256 hashes that make
//! tampering detectable. `CaseJournal` is the exported view of one case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use claimfill_contracts::pipeline::StageRecord;

/// A single entry in the SHA-256 hash chain for one case.
///
/// Each event commits to the previous event via `prev_hash`. Modifying any
/// field, including those of the embedded `record`, invalidates `this_hash`
/// and every later `prev_hash`, which `verify_chain` detects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEvent {
    /// Position in the case's chain, starting at 0.
    pub sequence: u64,

    pub case_id: String,

    pub record: StageRecord,

    /// SHA-256 hash (hex) of the previous event, or `GENESIS_HASH` for the
    /// first event of the case.
    pub prev_hash: String,

    /// SHA-256 hash (hex) over (case_id, sequence, prev_hash, record JSON).
    pub this_hash: String,
}

impl JournalEvent {
    /// The `prev_hash` of the first event in every chain: 64 hex zeros.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// Marks the end of one pipeline run or repair iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seal {
    /// Number of events in the chain when the seal was taken.
    pub event_count: usize,
    /// `this_hash` of the last sealed event.
    pub hash: String,
    pub sealed_at: DateTime<Utc>,
}

/// Everything journaled for one case, in chain order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseJournal {
    pub case_id: String,
    pub events: Vec<JournalEvent>,
    pub seals: Vec<Seal>,
    pub exported_at: DateTime<Utc>,
    /// The `this_hash` of the last event. Empty when nothing was written.
    pub terminal_hash: String,
}
