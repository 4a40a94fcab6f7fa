//! Task lookup by hierarchical name

use crate::config::{TaskDef, TaskFile};
use crate::error::{TaskError, TaskResult};
use crate::runner::{InputSpec, TaskDefinition, TaskName};
use std::collections::BTreeMap;

/// All tasks known to an application, keyed by their dotted name
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, TaskDefinition>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from a parsed task file, flattening nested `tasks` maps
    pub fn from_config(file: &TaskFile) -> Self {
        let mut registry = TaskRegistry::new();
        for (key, def) in &file.tasks {
            registry.insert_config(TaskName::parse(key), def);
        }
        registry
    }

    fn insert_config(&mut self, name: TaskName, def: &TaskDef) {
        for (key, child) in &def.tasks {
            self.insert_config(name.join(key), child);
        }
        self.insert(TaskDefinition::from_config(name, def));
    }

    /// Register a task. Missing ancestor namespaces are registered as empty tasks; an
    /// empty namespace entry is replaced when the real definition arrives.
    pub fn insert(&mut self, task: TaskDefinition) {
        let mut ancestor = task.name.parent();
        while let Ok(name) = ancestor {
            ancestor = name.parent();
            self.tasks
                .entry(name.short_string())
                .or_insert_with(|| TaskDefinition::namespace(name));
        }
        self.tasks.insert(task.name.short_string(), task);
    }

    pub fn find_task(&self, name: &TaskName) -> TaskResult<&TaskDefinition> {
        self.tasks
            .get(&name.short_string())
            .ok_or_else(|| TaskError::TaskNotFound(name.short_string()))
    }

    pub fn contains(&self, name: &TaskName) -> bool {
        self.tasks.contains_key(&name.short_string())
    }

    /// Read-only view of every task
    pub fn tasks(&self) -> &BTreeMap<String, TaskDefinition> {
        &self.tasks
    }

    /// Direct children of a namespace, in name order
    pub fn children(&self, parent: &TaskName) -> Vec<&TaskDefinition> {
        self.tasks
            .values()
            .filter(|task| task.name.parent().ok().as_ref() == Some(parent))
            .collect()
    }

    /// Top-level tasks
    pub fn roots(&self) -> Vec<&TaskDefinition> {
        self.tasks
            .values()
            .filter(|task| task.name.segments().len() == 1)
            .collect()
    }

    /// Name of the task that produces the value of `input` when nothing else does.
    ///
    /// The input name is looked up relative to each namespace enclosing `task`, innermost
    /// first; failing that, the same is tried with the last segment of the input name
    /// dropped, since it may select a field of another task's output
    /// (`build.artifact.digest` is produced by `build.artifact`). If nothing is registered
    /// the input name itself is returned.
    pub fn dependency_task(&self, task: &TaskName, input: &InputSpec) -> TaskName {
        let mut candidates = vec![input.name.clone()];
        if let Some((owner, _)) = input.name.rsplit_once('.') {
            candidates.push(owner.to_string());
        }

        for candidate in &candidates {
            for namespace in task.namespaces() {
                let name = namespace.join(candidate);
                if &name != task && self.contains(&name) {
                    return name;
                }
            }
        }

        TaskName::parse(&input.name)
    }
}
