//! Employment reference demo scenarios.
//!
//! Each scenario wires the real claimfill components (pipeline, journal,
//! verifier, case session) to the scripted model and the fictional case files
//! and shows one part of the workflow.

pub mod claim_value_conflict;
pub mod repair_conversation;
pub mod wage_claim;
