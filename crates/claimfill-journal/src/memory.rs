//! In-memory implementation of `JournalWriter`.
//!
//! `InMemoryJournal` keeps one hash chain per case in a map protected by a
//! `Mutex`, so it can be shared across the tasks of concurrent cases.
//!
//! Use `export()` to obtain a `CaseJournal` and `verify_integrity()` to
//! confirm a case's chain has not been tampered with in memory.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, info};

use claimfill_contracts::{
    error::{ClaimfillError, ClaimfillResult},
    pipeline::StageRecord,
};
use claimfill_core::traits::JournalWriter;

use crate::{
    chain::{hash_event, verify_chain},
    event::{CaseJournal, JournalEvent, Seal},
};

// ── Internal mutable state ────────────────────────────────────────────────────

pub(crate) struct CaseChain {
    pub(crate) events: Vec<JournalEvent>,
    pub(crate) seals: Vec<Seal>,
    /// `this_hash` of the last event, or `GENESIS_HASH` before the first.
    pub(crate) last_hash: String,
}

impl CaseChain {
    fn new() -> Self {
        Self {
            events: Vec::new(),
            seals: Vec::new(),
            last_hash: JournalEvent::GENESIS_HASH.to_string(),
        }
    }
}

// ── Public journal ────────────────────────────────────────────────────────────

/// An in-memory, append-only case journal backed by SHA-256 hash chains.
#[derive(Clone, Default)]
pub struct InMemoryJournal {
    pub(crate) cases: Arc<Mutex<HashMap<String, CaseChain>>>,
}

impl InMemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> ClaimfillResult<MutexGuard<'_, HashMap<String, CaseChain>>> {
        self.cases.lock().map_err(|e| ClaimfillError::JournalWriteFailed {
            reason: format!("journal lock poisoned: {e}"),
        })
    }

    /// Export everything journaled for `case_id`, or `None` for an unknown
    /// case.
    pub fn export(&self, case_id: &str) -> Option<CaseJournal> {
        let cases = self.lock().ok()?;
        let chain = cases.get(case_id)?;
        Some(CaseJournal {
            case_id: case_id.to_string(),
            events: chain.events.clone(),
            seals: chain.seals.clone(),
            exported_at: Utc::now(),
            terminal_hash: chain.events.last().map(|e| e.this_hash.clone()).unwrap_or_default(),
        })
    }

    /// Verify `case_id`'s chain. An unknown case has an empty, valid chain.
    pub fn verify_integrity(&self, case_id: &str) -> bool {
        match self.lock() {
            Ok(cases) => cases.get(case_id).map_or(true, |chain| verify_chain(&chain.events)),
            Err(_) => false,
        }
    }

    /// Ids of every journaled case, sorted.
    pub fn case_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().map(|c| c.keys().cloned().collect()).unwrap_or_default();
        ids.sort();
        ids
    }
}

// ── JournalWriter impl ────────────────────────────────────────────────────────

impl JournalWriter for InMemoryJournal {
    /// Append one stage record to `case_id`'s chain.
    fn write(&self, case_id: &str, record: &StageRecord) -> ClaimfillResult<()> {
        let mut cases = self.lock()?;
        let chain = cases.entry(case_id.to_string()).or_insert_with(CaseChain::new);

        let sequence = chain.events.len() as u64;
        let prev_hash = chain.last_hash.clone();
        let this_hash = hash_event(case_id, sequence, record, &prev_hash)?;

        debug!(case_id = %case_id, sequence, phase = %record.phase, "journal event appended");

        chain.events.push(JournalEvent {
            sequence,
            case_id: case_id.to_string(),
            record: record.clone(),
            prev_hash,
            this_hash: this_hash.clone(),
        });
        chain.last_hash = this_hash;

        Ok(())
    }

    /// Seal the events written since the previous seal.
    fn finalize(&self, case_id: &str) -> ClaimfillResult<()> {
        let mut cases = self.lock()?;
        let chain = cases.entry(case_id.to_string()).or_insert_with(CaseChain::new);

        let seal = Seal {
            event_count: chain.events.len(),
            hash: chain.last_hash.clone(),
            sealed_at: Utc::now(),
        };
        info!(
            case_id = %case_id,
            event_count = seal.event_count,
            terminal_hash = %seal.hash,
            "journal sealed"
        );
        chain.seals.push(seal);

        Ok(())
    }
}
