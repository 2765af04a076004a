//! # claimfill-ref-employment
//!
//! Employment-claim reference adapter for the claimfill pipeline.
//!
//! Demonstrates three scenarios using mock case files and a scripted model:
//!
//! 1. **Wage Claim Intake**: the full document pipeline, including an
//!    unreadable scan, party labels, audit findings and the case journal.
//! 2. **Claim Value Conflict**: a claimed total that disagrees with its own
//!    breakdown stays at the front of the missing keys until corrected.
//! 3. **Repair Conversation**: diagnostic replies, a completing patch, and
//!    free conversation once the record is complete.
//!
//! All data is hardcoded and fictional. No external API calls are made.

pub mod mock_data;
pub mod model;
pub mod runtime;
pub mod scenarios;
pub mod templates;
