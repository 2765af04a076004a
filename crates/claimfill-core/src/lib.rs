//! # claimfill-core
//!
//! The extraction pipeline and the interactive repair loop.
//!
//! This crate provides:
//! - The four capability traits (`ModelClient`, `DocumentReader`,
//!   `JournalWriter`, `Verifier`)
//! - The `Pipeline` that drives documents through Describe, Classify,
//!   Extract, Combine, Revise and the audits, journaling every transition
//! - The repair loop that turns chat replies into record patches, and the
//!   `CaseSession` that serialises work on one case
//!
//! ## Usage
//!
//! ```rust,ignore
//! use claimfill_core::{CaseSession, Collaborators, Pipeline};
//!
//! let pipeline = Pipeline::new(template, &config, schema, collaborators)?;
//! let session = CaseSession::new(Arc::new(pipeline));
//! let outcome = session.process(narrative, &paths).await?;
//! ```

pub mod audit;
pub mod fanout;
pub mod ingest;
pub mod narrative;
pub mod orchestrator;
pub mod parse;
pub mod render;
pub mod repair;
pub mod stages;
pub mod traits;

#[cfg(test)]
mod testing;

pub use ingest::{DocumentIngestor, FsTextReader};
pub use orchestrator::{Collaborators, Pipeline};
pub use repair::{is_claim_value_updated, reply_text, CaseSession};
