//! # claimfill-journal
//!
//! Append-only, SHA-256 hash-chained case journal for claimfill.
//!
//! ## Overview
//!
//! Every stage transition of a pipeline run, and every phase of a repair
//! iteration, is wrapped in a `JournalEvent` that links to the previous
//! event of the same case via its SHA-256 hash. Changing any event breaks
//! the chain and is detected by `verify_chain`. `finalize` seals the events
//! written so far, one seal per run or iteration.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use claimfill_journal::InMemoryJournal;
//! use claimfill_core::traits::JournalWriter;
//!
//! let journal = InMemoryJournal::new();
//! journal.write("case-001", &stage_record)?;
//! journal.finalize("case-001")?;
//!
//! assert!(journal.verify_integrity("case-001"));
//! let exported = journal.export("case-001");
//! ```

pub mod chain;
pub mod event;
pub mod memory;

pub use chain::{hash_event, verify_chain};
pub use event::{CaseJournal, JournalEvent, Seal};
pub use memory::InMemoryJournal;

// ── Tests ─────────────────────────────────────────────────────────────────────
