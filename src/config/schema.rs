//! Task file validation
//!
//! This module checks the structure of a parsed task file before any task runs.

use crate::config::types::{TaskDef, TaskFile};
use crate::error::{ConfigError, ConfigResult};
use crate::runner::TaskRegistry;
use std::collections::{HashMap, HashSet};

/// Validate a complete task file
pub fn validate_task_file(file: &TaskFile) -> ConfigResult<()> {
    validate_tasks(None, &file.tasks)?;

    // Check for circular dependencies between task steps
    detect_circular_task_dependencies(&TaskRegistry::from_config(file))?;

    Ok(())
}

fn validate_tasks(
    parent: Option<&str>,
    tasks: &std::collections::BTreeMap<String, TaskDef>,
) -> ConfigResult<()> {
    for (key, task) in tasks {
        let name = match parent {
            Some(parent) => format!("{}.{}", parent, key),
            None => key.clone(),
        };
        validate_task(&name, task)?;
        validate_tasks(Some(&name), &task.tasks)?;
    }
    Ok(())
}

/// Validate a single task
pub fn validate_task(name: &str, task: &TaskDef) -> ConfigResult<()> {
    if task.script.is_some() && !task.steps.is_empty() {
        return Err(ConfigError::ScriptAndSteps(name.to_string()));
    }

    let mut seen = HashSet::new();
    let mut indices: HashMap<usize, &str> = HashMap::new();

    for input in &task.inputs {
        if input.name.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "task '{}' declares an input without a name",
                name
            )));
        }

        if !seen.insert(input.name.as_str()) {
            return Err(ConfigError::DuplicateInput {
                task: name.to_string(),
                input: input.name.clone(),
            });
        }

        if let Some(index) = input.argument_index {
            if let Some(first) = indices.insert(index, &input.name) {
                return Err(ConfigError::DuplicateArgumentIndex {
                    task: name.to_string(),
                    first: first.to_string(),
                    second: input.name.clone(),
                    index,
                });
            }
        }
    }

    Ok(())
}

/// Detect circular dependencies between tasks invoked by steps
fn detect_circular_task_dependencies(registry: &TaskRegistry) -> ConfigResult<()> {
    let mut visited = HashSet::new();
    for task_name in registry.tasks().keys() {
        let mut stack = Vec::new();
        check_task_cycle(registry, task_name, &mut visited, &mut stack)?;
    }
    Ok(())
}

/// Recursively check for cycles in task steps
fn check_task_cycle(
    registry: &TaskRegistry,
    task_name: &str,
    visited: &mut HashSet<String>,
    stack: &mut Vec<String>,
) -> ConfigResult<()> {
    // Check if we've found a cycle
    if stack.iter().any(|name| name == task_name) {
        stack.push(task_name.to_string());
        return Err(ConfigError::CircularDependency(stack.join(" -> ")));
    }

    // Skip if already fully processed
    if visited.contains(task_name) {
        return Ok(());
    }

    let task = registry
        .tasks()
        .get(task_name)
        .ok_or_else(|| ConfigError::TaskNotFound(task_name.to_string()))?;

    stack.push(task_name.to_string());
    for step_task in task.step_tasks() {
        check_task_cycle(registry, &step_task, visited, stack)?;
    }
    stack.pop();
    visited.insert(task_name.to_string());

    Ok(())
}
