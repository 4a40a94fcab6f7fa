//! Task invocation
//!
//! [`Application::run_task`] is the entry point for running a task. One call starts a
//! run: every task invoked while resolving inputs or running steps belongs to the same
//! run and shares its output cache.
//!
//! A single invocation goes through these stages:
//!
//! 1. a scalar configuration value at the task's own key replaces the task entirely
//! 2. the task is looked up
//! 3. `args`, `env` and `cmd` are seeded into its variables
//! 4. inputs of the task and its namespaces are resolved and merged in
//! 5. the flattened variables are validated against the task's input schema
//! 6. the executor runs the task's steps and its output is returned
//!
//! Failures are annotated with the name of the task they aborted.

use crate::config::ConfigStore;
use crate::error::{TaskError, TaskResult};
use crate::runner::{
    gate, Arguments, InputResolver, InputType, Invoker, OutputCache, ShellExecutor,
    TaskContext, TaskExecutor, TaskName, TaskRegistry, Value,
};
use std::cell::RefCell;
use tracing::{debug, info};

/// Everything needed to run tasks from one task file
pub struct Application {
    /// Name of the task file's root command
    pub name: String,

    /// Environment label, bound to `env`
    pub env: String,

    /// Path of the task file, bound to `cmd`
    pub command_path: String,

    registry: TaskRegistry,
    config: ConfigStore,
    executor: Box<dyn TaskExecutor>,
}

impl Application {
    pub fn new(registry: TaskRegistry) -> Self {
        Application {
            name: "dotrun".to_string(),
            env: String::new(),
            command_path: String::new(),
            registry,
            config: ConfigStore::default(),
            executor: Box::new(ShellExecutor::new()),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_env(mut self, env: &str) -> Self {
        self.env = env.to_string();
        self
    }

    pub fn with_command_path(mut self, path: &str) -> Self {
        self.command_path = path.to_string();
        self
    }

    pub fn with_config(mut self, config: ConfigStore) -> Self {
        self.config = config;
        self
    }

    pub fn with_executor(mut self, executor: Box<dyn TaskExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn tasks(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// Run `name` in a new run and return its output
    pub fn run_task(
        &self,
        name: &TaskName,
        args: &[String],
        named: &Arguments,
        scope: &Value,
        caller: Option<&TaskName>,
    ) -> TaskResult<String> {
        Run::new(self).invoke(name, args, named, scope, caller)
    }

    /// Run the task at a dotted key with nothing in scope
    pub fn run_task_for_key(
        &self,
        key: &str,
        args: &[String],
        named: &Arguments,
    ) -> TaskResult<String> {
        self.run_task(&TaskName::parse(key), args, named, &Value::object(), None)
    }
}

/// State shared by every invocation of one run
struct Run<'a> {
    app: &'a Application,
    cache: OutputCache,

    /// Tasks currently being run, outermost first
    active: RefCell<Vec<String>>,
}

impl<'a> Run<'a> {
    fn new(app: &'a Application) -> Self {
        Run {
            app,
            cache: OutputCache::new(),
            active: RefCell::new(Vec::new()),
        }
    }

    fn run(
        &self,
        name: &TaskName,
        args: &[String],
        named: &Arguments,
        scope: &Value,
        caller: Option<&TaskName>,
    ) -> TaskResult<String> {
        let app = self.app;
        let short = name.short_string();

        let task = app.registry.find_task(name)?;

        let mut vars = Value::object();
        vars.set_path(
            &["args"],
            Value::Array(args.iter().cloned().map(Value::String).collect()),
        );
        vars.set_path(&["env"], Value::from(app.env.as_str()));
        vars.set_path(&["cmd"], Value::from(app.command_path.as_str()));

        let resolver = InputResolver::new(&app.registry, &app.config, &self.cache, self);
        let values = resolver.resolve_inherited(name, args, named, scope, caller)?;
        if let Value::Object(values) = values {
            for (key, value) in values {
                vars.set_path(&[key], value);
            }
        }

        gate::validate(&short, &task.inputs, &vars.flatten())?;

        debug!(task = %short, vars = %vars, "running task");
        let ctx = TaskContext::new(task, vars).with_caller(caller);
        let output = app.executor.execute(&ctx, self)?;

        debug!(task = %short, output = %output, "task finished");
        Ok(output)
    }

    /// Fails when `short` is already being run further up
    fn enter(&self, short: &str) -> TaskResult<()> {
        let mut active = self.active.borrow_mut();
        if active.iter().any(|name| name == short) {
            let mut chain = active.clone();
            chain.push(short.to_string());
            return Err(TaskError::CircularDependency(chain.join(" -> ")));
        }
        active.push(short.to_string());
        Ok(())
    }

    fn leave(&self) {
        self.active.borrow_mut().pop();
    }
}

impl Invoker for Run<'_> {
    fn invoke(
        &self,
        name: &TaskName,
        args: &[String],
        named: &Arguments,
        scope: &Value,
        caller: Option<&TaskName>,
    ) -> TaskResult<String> {
        let short = name.short_string();

        if let Some(value) = self
            .app
            .config
            .resolve(&short, &InputType::String)
            .filter(Value::is_scalar)
        {
            info!(task = %short, "using configured value instead of running the task");
            return Ok(value.render());
        }

        self.enter(&short)?;
        let result = self.run(name, args, named, scope, caller);
        self.leave();

        result.map_err(|e| {
            debug!(
                task = %short,
                caller = %caller.map(TaskName::short_string).unwrap_or_default(),
                "{}",
                e
            );
            e.in_task(&short)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_task_file;
    use crate::error::ExecutionResult;

    /// Returns the bound variables of every task it runs
    struct EchoVars;

    impl TaskExecutor for EchoVars {
        fn execute(&self, ctx: &TaskContext, _invoker: &dyn Invoker) -> ExecutionResult<String> {
            Ok(format!("{}", ctx.vars))
        }
    }

    fn app(yaml: &str) -> Application {
        let registry = TaskRegistry::from_config(&parse_task_file(yaml).unwrap());
        Application::new(registry).with_executor(Box::new(EchoVars))
    }

    #[test]
    fn test_seeds_implicit_vars() {
        let app = app("tasks:\n  hello: {}\n")
            .with_env("staging")
            .with_command_path("dotrun.yml");

        let output = app
            .run_task_for_key("hello", &["a".to_string()], &Arguments::new())
            .unwrap();
        let vars: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(vars["args"], serde_json::json!(["a"]));
        assert_eq!(vars["env"], "staging");
        assert_eq!(vars["cmd"], "dotrun.yml");
    }

    #[test]
    fn test_task_not_found_is_annotated() {
        let app = app("tasks:\n  hello: {}\n");
        let err = app
            .run_task_for_key("nope", &[], &Arguments::new())
            .unwrap_err();

        assert!(matches!(&err, TaskError::Task { task, .. } if task == "nope"));
        assert!(matches!(err.root_cause(), TaskError::TaskNotFound(name) if name == "nope"));
    }

    #[test]
    fn test_circular_dependency() {
        let app = app(
            r#"
tasks:
  a:
    inputs:
      - name: b
  b:
    inputs:
      - name: a
"#,
        );
        let err = app.run_task_for_key("a", &[], &Arguments::new()).unwrap_err();

        assert!(matches!(
            err.root_cause(),
            TaskError::CircularDependency(chain) if chain == "a -> b -> a"
        ));
    }

    #[test]
    fn test_scalar_config_stubs_task() {
        let config = ConfigStore::from_yaml_str("hello: stubbed\n").unwrap();
        let app = app("tasks:\n  hello: {}\n").with_config(config);

        let output = app.run_task_for_key("hello", &[], &Arguments::new()).unwrap();
        assert_eq!(output, "stubbed");
    }

    #[test]
    fn test_config_section_does_not_stub_task() {
        let config = ConfigStore::from_yaml_str("deploy:\n  region: eu-west-1\n").unwrap();
        let app = app(
            r#"
tasks:
  deploy:
    inputs:
      - name: region
"#,
        )
        .with_config(config);

        let output = app.run_task_for_key("deploy", &[], &Arguments::new()).unwrap();
        let vars: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(vars["region"], "eu-west-1");
    }
}
