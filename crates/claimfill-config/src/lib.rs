//! # claimfill-config
//!
//! TOML-driven configuration for the claimfill pipeline.
//!
//! ## Overview
//!
//! A single TOML document carries three things:
//!
//! - `[pipeline]`: concurrency, id length, narrative sentinel, claim-value path
//! - `[instructions]`: the instruction template for each model-backed stage
//! - `[[rules]]`: record verification rules, in declaration order
//!
//! Every section is optional; [`PipelineConfig::default`] is a working setup.
//! Schema templates are JSON and are loaded separately with [`load_template`].
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use claimfill_config::{load_template, PipelineConfig};
//!
//! let config = PipelineConfig::from_file(Path::new("config/employment.toml"))?;
//! let template = load_template(Path::new("config/employment_form.json"))?;
//! ```

pub mod instructions;
pub mod rule;
pub mod settings;
pub mod template;

pub use instructions::{render_template, InstructionSet};
pub use rule::{RuleConfig, RuleKind};
pub use settings::{PipelineConfig, PipelineSettings};
pub use template::{load_template, parse_template};

// ── Tests ─────────────────────────────────────────────────────────────────────
