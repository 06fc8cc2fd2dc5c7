//! Two-tier validation for task graph documents.
//!
//! Tier 1 checks structure against embedded JSON Schemas. Tier 2 parses the
//! document into the typed model and runs the semantic rule registry. The
//! parsed graph is handed out only when both tiers pass.

pub mod diagnostics;
pub mod errors;
pub mod model;
pub mod rules;
pub mod schema;
pub mod topology;
pub mod validate;

pub use diagnostics::*;
pub use errors::*;
pub use model::*;
pub use rules::*;
pub use schema::*;
pub use topology::*;
pub use validate::*;
