//! Dotrun - a hierarchical YAML task runner
//!
//! Tasks are organised in dotted namespaces and declare typed inputs. An input's value
//! comes from the command line, from configuration, from a default, or from the output of
//! another task, which is run on demand at most once per invocation.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;

// Re-export commonly used types
pub use error::{DotrunError, Result};

/// Current version of Dotrun
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
