//! Hash-chain primitives: hashing and chain integrity verification.
//!
//! Hash input layout (bytes, in order):
//!   1. case_id as UTF-8 bytes
//!   2. sequence as 8-byte little-endian
//!   3. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   4. compact JSON of the record

use sha2::{Digest, Sha256};

use claimfill_contracts::{
    error::{ClaimfillError, ClaimfillResult},
    pipeline::StageRecord,
};

use crate::event::JournalEvent;

/// Compute the SHA-256 hash for a single journal event.
///
/// Returns a lowercase 64-character hex string, or `JournalWriteFailed` if
/// the record cannot be serialised.
pub fn hash_event(
    case_id: &str,
    sequence: u64,
    record: &StageRecord,
    prev_hash: &str,
) -> ClaimfillResult<String> {
    let record_json = serde_json::to_vec(record).map_err(|e| ClaimfillError::JournalWriteFailed {
        reason: format!("stage record is not serialisable: {e}"),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(case_id.as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&record_json);

    Ok(hex::encode(hasher.finalize()))
}

/// Verify the integrity of one case's hash chain.
///
/// Valid when every `prev_hash` equals the preceding `this_hash` (or
/// `GENESIS_HASH` for the first event), every `this_hash` matches the value
/// recomputed from the event, and sequences run 0, 1, 2, … without gaps. An
/// empty chain is valid.
pub fn verify_chain(events: &[JournalEvent]) -> bool {
    let mut expected_prev = JournalEvent::GENESIS_HASH.to_string();

    for (position, event) in events.iter().enumerate() {
        if event.sequence != position as u64 || event.prev_hash != expected_prev {
            return false;
        }

        match hash_event(&event.case_id, event.sequence, &event.record, &event.prev_hash) {
            Ok(recomputed) if recomputed == event.this_hash => {}
            _ => return false,
        }

        expected_prev = event.this_hash.clone();
    }

    true
}
