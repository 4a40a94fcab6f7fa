//! Command execution
//!
//! This module runs the steps of a bound task and captures their output.

use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::{
    interpolate, interpolate_list, Arguments, Invoker, Step, TaskContext, TaskName, Value,
};
use std::path::PathBuf;
use std::process::{Command as StdCommand, Stdio};
use tracing::{debug, info};

/// Runs the body of a task whose inputs are resolved
pub trait TaskExecutor {
    /// Run every step of `ctx.task` and return the task's output.
    ///
    /// Task steps are run through `invoker` so they share the caller's run.
    fn execute(&self, ctx: &TaskContext, invoker: &dyn Invoker) -> ExecutionResult<String>;
}

/// Executes steps with an interpreter such as `sh -c`
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    /// Directory the steps run in
    pub working_dir: PathBuf,

    /// Interpreter and its arguments; the step is appended as the last argument
    pub interpreter: Vec<String>,
}

impl Default for ShellExecutor {
    fn default() -> Self {
        ShellExecutor {
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            interpreter: vec!["sh".to_string(), "-c".to_string()],
        }
    }
}

impl ShellExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = dir;
        self
    }

    pub fn with_interpreter(mut self, interpreter: Vec<String>) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// Run one script and capture its standard output
    fn run_script(&self, script: &str, ctx: &TaskContext) -> ExecutionResult<String> {
        let exec_str = ctx.render(script)?;
        let (program, interpreter_args) = self
            .interpreter
            .split_first()
            .ok_or(ExecutionError::EmptyInterpreter)?;

        info!(task = %ctx.name(), "[RUN] {}", exec_str);

        let mut command = StdCommand::new(program);
        command.args(interpreter_args);
        command.arg(&exec_str);
        command.current_dir(&self.working_dir);

        // Output is the task's result; progress goes to the terminal
        command.stdin(Stdio::inherit());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::inherit());

        command.envs(ctx.env_vars());

        let output = command.output().map_err(|e| ExecutionError::Spawn {
            program: program.clone(),
            error: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(ExecutionError::CommandFailed(output.status.code()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.trim_end_matches(['\n', '\r']).to_string())
    }

    /// Run a task step through the invoker
    fn run_task_step(
        &self,
        name: &str,
        args: &[String],
        inputs: &std::collections::BTreeMap<String, Value>,
        ctx: &TaskContext,
        invoker: &dyn Invoker,
    ) -> ExecutionResult<String> {
        let args = interpolate_list(args, &ctx.vars)?;

        let mut named = Arguments::new();
        for (key, value) in inputs {
            let value = match value {
                Value::String(s) => Value::String(interpolate(s, &ctx.vars)?),
                other => other.clone(),
            };
            named.set(key, value);
        }

        debug!(task = %ctx.name(), step = name, "running task step");
        invoker
            .invoke(
                &TaskName::parse(name),
                &args,
                &named,
                &ctx.vars,
                Some(ctx.name()),
            )
            .map_err(|e| ExecutionError::Subtask {
                name: name.to_string(),
                source: Box::new(e),
            })
    }
}

impl TaskExecutor for ShellExecutor {
    fn execute(&self, ctx: &TaskContext, invoker: &dyn Invoker) -> ExecutionResult<String> {
        let mut output = String::new();

        for step in &ctx.task.steps {
            output = match step {
                Step::Script(script) => self.run_script(script, ctx)?,
                Step::Task { name, args, inputs } => {
                    self.run_task_step(name, args, inputs, ctx, invoker)?
                }
            };
        }

        Ok(output)
    }
}
