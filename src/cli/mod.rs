//! CLI interface and argument parsing
//!
//! This module turns the tasks of a task file into nested subcommands, sets up logging,
//! and generates shell completions.

pub mod app;
pub mod logging;

// Re-export main types
pub use app::*;
pub use logging::*;
