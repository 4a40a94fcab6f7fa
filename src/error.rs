//! Error types for dotrun

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for dotrun operations
pub type Result<T> = std::result::Result<T, DotrunError>;

/// Main error type for dotrun
#[derive(Error, Debug)]
pub enum DotrunError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Task resolution and invocation errors
    #[error(transparent)]
    Task(#[from] TaskError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Task file and configuration store errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find task file (searched: {0})")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Task '{0}' declares both `script` and `steps`")]
    ScriptAndSteps(String),

    #[error("Input '{input}' is declared more than once in task '{task}'")]
    DuplicateInput { task: String, input: String },

    #[error("Inputs '{first}' and '{second}' of task '{task}' share argument index {index}")]
    DuplicateArgumentIndex {
        task: String,
        first: String,
        second: String,
        index: usize,
    },

    #[error("Task '{0}' is not defined")]
    TaskNotFound(String),

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("Failed to read '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },
}

/// Returned by [`crate::runner::TaskName::parent`] at the namespace root
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("task name has no parent")]
pub struct NoParent;

/// Errors raised while resolving inputs for, validating, or running a task
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("task '{0}' is not defined")]
    TaskNotFound(String),

    #[error(
        "missing value for input `{input}`. Please provide a command line option or a positional argument or a task for it"
    )]
    MissingInput {
        input: String,
        #[source]
        source: Box<TaskError>,
    },

    #[error("unsupported input type `{0}` found. the type should be one of: string, integer, boolean, array, object")]
    UnsupportedInputType(String),

    #[error("{value:?} can't be converted to {type_name}: {reason}")]
    TypeConversion {
        value: String,
        type_name: String,
        reason: String,
    },

    #[error("failed to render input `{input}` of task {task}")]
    Template {
        task: String,
        input: String,
        #[source]
        source: InterpolationError,
    },

    #[error("one or more inputs of task {task} are not valid: {}", violations.join("; "))]
    InvalidInput {
        task: String,
        violations: Vec<String>,
    },

    #[error("failed to build input schema for task {task}: {reason}")]
    Schema { task: String, reason: String },

    #[error("circular task dependency: {0}")]
    CircularDependency(String),

    #[error("one or more inputs for task {task} failed")]
    Inputs {
        task: String,
        #[source]
        source: Box<TaskError>,
    },

    #[error("failed running task {task}")]
    Task {
        task: String,
        #[source]
        source: Box<TaskError>,
    },

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl TaskError {
    /// Wrap this error with the name of the task whose run it aborted
    pub fn in_task(self, task: &str) -> Self {
        TaskError::Task {
            task: task.to_string(),
            source: Box::new(self),
        }
    }

    /// Wrap this error with the name of the task whose inputs were being collected
    pub fn in_inputs_of(self, task: &str) -> Self {
        TaskError::Inputs {
            task: task.to_string(),
            source: Box::new(self),
        }
    }

    /// The innermost error of an annotation chain
    pub fn root_cause(&self) -> &TaskError {
        match self {
            TaskError::Task { source, .. }
            | TaskError::Inputs { source, .. }
            | TaskError::MissingInput { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Errors from the task execution engine
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Command failed with exit code {0:?}")]
    CommandFailed(Option<i32>),

    #[error("Failed to spawn '{program}': {error}")]
    Spawn { program: String, error: String },

    #[error("Interpreter is empty")]
    EmptyInterpreter,

    #[error("Failed to render step: {0}")]
    Render(#[from] InterpolationError),

    #[error("Step task '{name}' failed")]
    Subtask {
        name: String,
        #[source]
        source: Box<TaskError>,
    },
}

/// Variable interpolation errors
#[derive(Error, Debug)]
pub enum InterpolationError {
    #[error("Variable '{0}' is not defined")]
    UndefinedVariable(String),

    #[error("Invalid interpolation syntax: {0}")]
    InvalidSyntax(String),

    #[error("Recursive interpolation detected")]
    RecursiveInterpolation,
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for task operations
pub type TaskResult<T> = std::result::Result<T, TaskError>;

/// Specialized result type for execution operations
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

/// Specialized result type for interpolation operations
pub type InterpolationResult<T> = std::result::Result<T, InterpolationError>;
