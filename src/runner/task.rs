//! Task definition types
//!
//! This module contains the runtime representation of tasks and their inputs.

use crate::config;
use crate::runner::{split_path, TaskName, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Variable names that are always present in a task's scope
pub const IMPLICIT_VARS: &[&str] = &["args", "env", "cmd"];

/// Runtime task representation
///
/// This differs from config::TaskDef by carrying its full dotted name and parsed inputs.
#[derive(Debug, Clone)]
pub struct TaskDefinition {
    /// Full task name
    pub name: TaskName,

    /// Description
    pub description: Option<String>,

    /// Whether this task is private
    pub private: bool,

    /// Declared inputs, in resolution order
    pub inputs: Vec<InputSpec>,

    /// Steps to execute
    pub steps: Vec<Step>,
}

impl TaskDefinition {
    /// Create a task from configuration. Child tasks are not included.
    pub fn from_config(name: TaskName, config: &config::TaskDef) -> Self {
        let mut steps: Vec<Step> = config.steps.iter().cloned().map(Step::from_config).collect();
        if let Some(script) = &config.script {
            steps.insert(0, Step::Script(script.clone()));
        }

        TaskDefinition {
            name,
            description: config.description.clone(),
            private: config.private,
            inputs: config
                .inputs
                .iter()
                .cloned()
                .map(InputSpec::from_config)
                .collect(),
            steps,
        }
    }

    /// An empty task standing for a namespace
    pub fn namespace(name: TaskName) -> Self {
        TaskDefinition {
            name,
            description: None,
            private: false,
            inputs: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// Names of tasks invoked by this task's steps
    pub fn step_tasks(&self) -> Vec<String> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                Step::Task { name, .. } => Some(name.clone()),
                Step::Script(_) => None,
            })
            .collect()
    }
}

/// Declared input type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputType {
    String,
    Integer,
    Boolean,
    Array,
    Object,
    /// Anything else; rejected when a value has to be converted to it
    Unsupported(String),
}

impl InputType {
    pub fn parse(type_name: &str) -> Self {
        match type_name {
            "string" => InputType::String,
            "integer" => InputType::Integer,
            "boolean" => InputType::Boolean,
            "array" => InputType::Array,
            "object" => InputType::Object,
            other => InputType::Unsupported(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            InputType::String => "string",
            InputType::Integer => "integer",
            InputType::Boolean => "boolean",
            InputType::Array => "array",
            InputType::Object => "object",
            InputType::Unsupported(other) => other,
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime representation of an input declaration
#[derive(Debug, Clone)]
pub struct InputSpec {
    /// Dotted name; the resolved value is stored at this path
    pub name: String,
    short_name: String,
    pub argument_index: Option<usize>,
    pub input_type: InputType,
    pub default: Option<Value>,
    pub description: Option<String>,
}

impl InputSpec {
    pub fn from_config(config: config::InputDef) -> Self {
        let short_name = config
            .short_name
            .unwrap_or_else(|| leaf_of(&config.name).to_string());

        InputSpec {
            short_name,
            argument_index: config.argument_index,
            input_type: InputType::parse(&config.input_type),
            default: config.default.and_then(Value::from_yaml),
            description: config.description,
            name: config.name,
        }
    }

    /// A string input with no default
    pub fn new(name: &str) -> Self {
        InputSpec {
            name: name.to_string(),
            short_name: leaf_of(name).to_string(),
            argument_index: None,
            input_type: InputType::String,
            default: None,
            description: None,
        }
    }

    pub fn with_type(mut self, input_type: InputType) -> Self {
        self.input_type = input_type;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_argument_index(mut self, index: usize) -> Self {
        self.argument_index = Some(index);
        self
    }

    pub fn with_short_name(mut self, short_name: &str) -> Self {
        self.short_name = short_name.to_string();
        self
    }

    /// Name used for named arguments and configuration keys
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// Path segments of [`InputSpec::name`]
    pub fn path(&self) -> Vec<&str> {
        split_path(&self.name)
    }

    /// Whether a value must be supplied for the task to run
    pub fn required(&self) -> bool {
        self.default.is_none() && !IMPLICIT_VARS.contains(&self.name.as_str())
    }
}

fn leaf_of(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Runtime representation of a step
#[derive(Debug, Clone)]
pub enum Step {
    /// Script run through the interpreter
    Script(String),

    /// Invocation of another task
    Task {
        name: String,
        args: Vec<String>,
        inputs: BTreeMap<String, Value>,
    },
}

impl Step {
    pub fn from_config(config: config::StepDef) -> Self {
        match config {
            config::StepDef::Simple(script) | config::StepDef::Script { script } => {
                Step::Script(script)
            }
            config::StepDef::Task(step) => Step::Task {
                name: step.task,
                args: step.args,
                inputs: step
                    .inputs
                    .into_iter()
                    .filter_map(|(k, v)| Value::from_yaml(v).map(|v| (k, v)))
                    .collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_name_defaults_to_leaf() {
        let input = InputSpec::new("build.artifact.digest");
        assert_eq!(input.short_name(), "digest");
        assert_eq!(input.path(), vec!["build", "artifact", "digest"]);
        assert_eq!(InputSpec::new("region").short_name(), "region");
    }

    #[test]
    fn test_required() {
        assert!(InputSpec::new("region").required());
        assert!(!InputSpec::new("replicas").with_default(3).required());
        assert!(!InputSpec::new("env").required());
        assert!(!InputSpec::new("args").required());
    }

    #[test]
    fn test_input_type_parse() {
        assert_eq!(InputType::parse("boolean"), InputType::Boolean);
        assert_eq!(
            InputType::parse("float"),
            InputType::Unsupported("float".to_string())
        );
        assert_eq!(InputType::parse("float").as_str(), "float");
    }

    #[test]
    fn test_from_config_puts_script_first() {
        let yaml = r#"
inputs:
  - name: tag
    short-name: t
    type: string
script: echo first
steps:
  - task: build.artifact
"#;
        let def: config::TaskDef = serde_yaml::from_str(yaml).unwrap();
        let task = TaskDefinition::from_config(TaskName::parse("build.image"), &def);

        assert!(matches!(&task.steps[0], Step::Script(s) if s == "echo first"));
        assert_eq!(task.step_tasks(), vec!["build.artifact".to_string()]);
        assert_eq!(task.inputs[0].short_name(), "t");
    }
}
