//! # claimfill-verify
//!
//! Record verification for the claimfill pipeline.
//!
//! This crate provides [`engine::RecordVerifier`], which implements the
//! [`claimfill_core::traits::Verifier`] trait. It checks the working record
//! in two phases:
//!
//! 1. **Structural**: JSON Schema validation via the `jsonschema` crate,
//!    against a schema derived from the template by
//!    [`engine::structural_schema`].
//! 2. **Rules**: `RequiredField`, `AllowedValues`, `ForbiddenPattern` and
//!    `Custom` rules evaluated against the record.
//!
//! [`claim`] holds the claim-value arithmetic used to reproduce the
//! evaluator's verdict.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use claimfill_verify::{claim, engine::RecordVerifier};
//!
//! let mut verifier = RecordVerifier::new();
//! verifier.register_rule("claim-value-is-amount", claim::amount_rule("claim_details.claim_value"));
//! let schema = claimfill_verify::record_schema("claim-record", &template, rules);
//! ```

pub mod claim;
pub mod engine;

pub use engine::{record_schema, structural_schema, RecordVerifier};
