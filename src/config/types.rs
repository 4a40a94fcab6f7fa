//! Core configuration types
//!
//! This module defines the data structures that represent a dotrun.yml task file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level task file structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TaskFile {
    /// Application name (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Application usage description (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,

    /// Top-level tasks. Keys may be dotted.
    #[serde(default)]
    pub tasks: BTreeMap<String, TaskDef>,

    /// Global interpreter to use for scripts (e.g., ["sh", "-c"])
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<Vec<String>>,
}

/// A task definition
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TaskDef {
    /// Description for help text
    #[serde(default, alias = "usage", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether this task is private (hidden from help)
    #[serde(default)]
    pub private: bool,

    /// Declared inputs, in resolution order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<InputDef>,

    /// Single script body; shorthand for one script step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,

    /// Steps to execute
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_steps"
    )]
    pub steps: Vec<StepDef>,

    /// Child tasks in this task's namespace
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tasks: BTreeMap<String, TaskDef>,
}

/// An input declaration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct InputDef {
    /// Dotted name; also the path the resolved value is stored at
    pub name: String,

    /// Alias used for named arguments and configuration keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,

    /// Positional argument slot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument_index: Option<usize>,

    /// Value type (string, integer, boolean, array, object)
    #[serde(rename = "type", default = "default_input_type")]
    pub input_type: String,

    /// Default value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_yaml::Value>,

    /// Description for help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_input_type() -> String {
    "string".to_string()
}

/// A step - either a script or an invocation of another task
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum StepDef {
    /// Bare string script
    Simple(String),

    /// Script step
    Script { script: String },

    /// Task step
    Task(TaskStepDef),
}

/// Invocation of another task from a step
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskStepDef {
    /// Dotted name of the task to run
    pub task: String,

    /// Positional arguments (interpolated)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Named arguments (string values are interpolated)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, serde_yaml::Value>,
}

/// Custom deserializer for steps that handles both single values and arrays
fn deserialize_steps<'de, D>(deserializer: D) -> Result<Vec<StepDef>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    let value = Value::deserialize(deserializer)?;

    match value {
        // Single script
        Value::String(s) => Ok(vec![StepDef::Simple(s)]),
        // Single script or task step
        Value::Mapping(_) => {
            let step = StepDef::deserialize(value).map_err(D::Error::custom)?;
            Ok(vec![step])
        }
        // Array of steps
        Value::Sequence(seq) => {
            let mut steps = Vec::new();
            for item in seq {
                let step = StepDef::deserialize(item).map_err(D::Error::custom)?;
                steps.push(step);
            }
            Ok(steps)
        }
        // Null or not present
        Value::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("steps must be a string, object, or array")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_simple_task_file() {
        let yaml = r#"
tasks:
  hello:
    description: Say hello
    script: echo "hello"
"#;
        let file: TaskFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.tasks.len(), 1);
        assert!(file.tasks.contains_key("hello"));
    }

    #[test]
    fn test_deserialize_inputs() {
        let yaml = r#"
tasks:
  deploy:
    inputs:
      - name: region
        argument-index: 0
      - name: replicas
        type: integer
        default: 3
    script: echo "${region}"
"#;
        let file: TaskFile = serde_yaml::from_str(yaml).unwrap();
        let task = file.tasks.get("deploy").unwrap();
        assert_eq!(task.inputs.len(), 2);
        assert_eq!(task.inputs[0].input_type, "string");
        assert_eq!(task.inputs[0].argument_index, Some(0));
        assert_eq!(task.inputs[1].input_type, "integer");
        assert_eq!(
            task.inputs[1].default,
            Some(serde_yaml::Value::Number(3.into()))
        );
    }

    #[test]
    fn test_deserialize_steps_forms() {
        let yaml = r#"
tasks:
  single:
    steps: echo one
  mixed:
    steps:
      - echo one
      - script: echo two
      - task: build.image
        args: [latest]
        inputs:
          tag: "${version}"
    tasks:
      child:
        usage: nested child
"#;
        let file: TaskFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.tasks["single"].steps.len(), 1);

        let mixed = &file.tasks["mixed"];
        assert_eq!(mixed.steps.len(), 3);
        assert!(matches!(&mixed.steps[1], StepDef::Script { script } if script == "echo two"));
        assert!(matches!(&mixed.steps[2], StepDef::Task(step) if step.task == "build.image"));
        assert_eq!(
            mixed.tasks["child"].description.as_deref(),
            Some("nested child")
        );
    }
}
