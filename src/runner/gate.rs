//! Input validation against a JSON schema derived from input declarations

use crate::error::{TaskError, TaskResult};
use crate::runner::{InputSpec, InputType, Map};
use serde_json::json;
use tracing::error;

/// Property name of an input in the schema and in validated documents
fn property_name(name: &str) -> String {
    name.replace('-', "_")
}

/// Object schema with one property per input
pub fn input_schema(inputs: &[InputSpec]) -> serde_json::Value {
    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();

    for input in inputs {
        let name = property_name(&input.name);
        let shape = match &input.input_type {
            InputType::Unsupported(_) => json!({}),
            known => json!({ "type": known.as_str() }),
        };
        properties.insert(name.clone(), shape);

        if input.required() {
            required.push(serde_json::Value::String(name));
        }
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Validate flattened task variables against the inputs of `task`.
///
/// Every violation is reported, not only the first one.
pub fn validate(task: &str, inputs: &[InputSpec], vars: &Map) -> TaskResult<()> {
    let schema = input_schema(inputs);
    let validator = jsonschema::validator_for(&schema).map_err(|e| TaskError::Schema {
        task: task.to_string(),
        reason: e.to_string(),
    })?;

    let document: serde_json::Map<String, serde_json::Value> = vars
        .iter()
        .map(|(key, value)| (property_name(key), serde_json::Value::from(value)))
        .collect();
    let document = serde_json::Value::Object(document);

    let violations: Vec<String> = validator
        .iter_errors(&document)
        .map(|violation| violation.to_string())
        .collect();

    if violations.is_empty() {
        return Ok(());
    }

    for violation in &violations {
        error!(task = task, "{}", violation);
    }

    Err(TaskError::InvalidInput {
        task: task.to_string(),
        violations,
    })
}
