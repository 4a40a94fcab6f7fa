//! Rendering input expressions and converting them to typed values

use crate::error::{TaskError, TaskResult};
use crate::runner::{interpolate_strict, InputType, TaskName, Value};
use tracing::debug;

/// A variable scope bound to the task whose inputs are being rendered
pub struct TaskTemplate<'a> {
    task: &'a TaskName,
    scope: &'a Value,
}

impl<'a> TaskTemplate<'a> {
    pub fn new(task: &'a TaskName, scope: &'a Value) -> Self {
        TaskTemplate { task, scope }
    }

    /// Render `expr`; `label` names the input being rendered in errors
    pub fn render(&self, expr: &str, label: &str) -> TaskResult<String> {
        debug!(task = %self.task, input = label, "rendering {}", expr);
        interpolate_strict(expr, self.scope).map_err(|source| TaskError::Template {
            task: self.task.short_string(),
            input: label.to_string(),
            source,
        })
    }
}

/// Convert rendered text to the declared input type
pub fn convert(rendered: &str, input_type: &InputType) -> TaskResult<Value> {
    let conversion_error = |reason: String| TaskError::TypeConversion {
        value: rendered.to_string(),
        type_name: input_type.to_string(),
        reason,
    };

    match input_type {
        InputType::String => Ok(Value::String(rendered.to_string())),
        InputType::Integer => rendered
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|e| conversion_error(e.to_string())),
        InputType::Boolean => match rendered {
            "true" => Ok(Value::Boolean(true)),
            "false" => Ok(Value::Boolean(false)),
            _ => Err(conversion_error(
                "only `true` and `false` are accepted".to_string(),
            )),
        },
        InputType::Array | InputType::Object => {
            let json: serde_json::Value = serde_json::from_str(rendered)
                .map_err(|e| conversion_error(format!("failed to parse as json: {}", e)))?;
            match (input_type, Value::from_json(json)) {
                (InputType::Array, Some(value @ Value::Array(_)))
                | (InputType::Object, Some(value @ Value::Object(_))) => Ok(value),
                (_, other) => Err(conversion_error(format!(
                    "expected {}, found {}",
                    input_type,
                    other.as_ref().map_or("null", Value::kind)
                ))),
            }
        }
        InputType::Unsupported(name) => Err(TaskError::UnsupportedInputType(name.clone())),
    }
}
