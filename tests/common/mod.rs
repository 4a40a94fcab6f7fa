//! Common test utilities
#![allow(dead_code)]

use dotrun::config::{parse_task_file, ConfigStore};
use dotrun::error::ExecutionResult;
use dotrun::runner::{Application, Invoker, TaskContext, TaskExecutor, TaskRegistry};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::TempDir;

/// Create a temporary directory with a dotrun.yml file
pub fn create_task_file(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let task_file = temp_dir.path().join("dotrun.yml");
    fs::write(&task_file, content).unwrap();
    (temp_dir, task_file)
}

/// Write another file next to the task file
pub fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Records the tasks it is asked to run instead of running their steps.
///
/// A task's output is the one registered with [`RecordingExecutor::with_output`], or else
/// its bound variables as JSON.
#[derive(Clone, Default)]
pub struct RecordingExecutor {
    outputs: HashMap<String, String>,
    calls: Rc<RefCell<Vec<String>>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, task: &str, output: &str) -> Self {
        self.outputs.insert(task.to_string(), output.to_string());
        self
    }

    /// Names of the tasks run so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, task: &str) -> usize {
        self.calls.borrow().iter().filter(|name| *name == task).count()
    }
}

impl TaskExecutor for RecordingExecutor {
    fn execute(&self, ctx: &TaskContext, _invoker: &dyn Invoker) -> ExecutionResult<String> {
        let name = ctx.name().short_string();
        self.calls.borrow_mut().push(name.clone());
        Ok(self
            .outputs
            .get(&name)
            .cloned()
            .unwrap_or_else(|| ctx.vars.to_string()))
    }
}

/// An application over `yaml` that runs tasks with `executor`
pub fn application(yaml: &str, config: &str, executor: &RecordingExecutor) -> Application {
    let registry = TaskRegistry::from_config(&parse_task_file(yaml).unwrap());
    Application::new(registry)
        .with_config(ConfigStore::from_yaml_str(config).unwrap())
        .with_executor(Box::new(executor.clone()))
}

/// Parse task output produced by [`RecordingExecutor`] for a task without a fixed output
pub fn vars_of(output: &str) -> serde_json::Value {
    serde_json::from_str(output).unwrap()
}
