//! Task resolution and execution engine
//!
//! This module resolves the inputs of tasks, validates them, and runs task steps,
//! invoking the tasks that produce missing inputs along the way.

pub mod cache;
pub mod command;
pub mod context;
pub mod gate;
pub mod interpolate;
pub mod invoke;
pub mod name;
pub mod registry;
pub mod resolve;
pub mod task;
pub mod template;
pub mod value;

// Re-export main types
pub use cache::*;
pub use command::*;
pub use context::*;
pub use interpolate::*;
pub use invoke::*;
pub use name::*;
pub use registry::*;
pub use resolve::*;
pub use task::*;
pub use template::*;
pub use value::*;
