//! Execution context for task running
//!
//! The context binds a task to the variables resolved for one invocation of it.

use crate::error::InterpolationResult;
use crate::runner::{interpolate, TaskDefinition, TaskName, Value};

/// A task bound to its resolved variables
pub struct TaskContext<'a> {
    /// Task being run
    pub task: &'a TaskDefinition,

    /// Variables (`args`, `env`, `cmd` and resolved inputs)
    pub vars: Value,

    /// Task whose input or step caused this run
    pub caller: Option<&'a TaskName>,
}

impl<'a> TaskContext<'a> {
    pub fn new(task: &'a TaskDefinition, vars: Value) -> Self {
        TaskContext {
            task,
            vars,
            caller: None,
        }
    }

    pub fn with_caller(mut self, caller: Option<&'a TaskName>) -> Self {
        self.caller = caller;
        self
    }

    pub fn name(&self) -> &TaskName {
        &self.task.name
    }

    /// Interpolate a step against the bound variables. Unknown variables are left alone so
    /// shell variables survive.
    pub fn render(&self, s: &str) -> InterpolationResult<String> {
        interpolate(s, &self.vars)
    }

    /// Scalar variables as environment variables: `build.tag` is exported as `build_tag`
    pub fn env_vars(&self) -> Vec<(String, String)> {
        self.vars
            .flatten()
            .into_iter()
            .filter(|(_, value)| value.is_scalar())
            .map(|(key, value)| (key.replace(['.', '-'], "_"), value.render()))
            .collect()
    }
}
