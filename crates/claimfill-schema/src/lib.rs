//! # claimfill-schema
//!
//! Pure functions over schema templates and records:
//!
//! - `walker`   — which leaves of a template are still unfilled in a record
//! - `injector` — merge a flat dotted-path patch into a nested record
//! - `template` — template invariants, checked once at pipeline construction
//! - `path`     — dotted-path parsing and lookup shared by the above
//!
//! Nothing here performs I/O or calls a model.

pub mod injector;
pub mod path;
pub mod template;
pub mod walker;

pub use injector::inject;
pub use path::resolve;
pub use template::validate_template;
pub use walker::{all_keys, find_all_leaf_paths, find_missing, is_complete};
