//! Task file and configuration handling
//!
//! This module parses `dotrun.yml` task files, validates their structure, and loads the
//! configuration store that supplies input values.

pub mod parse;
pub mod schema;
pub mod store;
pub mod types;

// Re-export main types
pub use parse::*;
pub use schema::*;
pub use store::*;
pub use types::*;
