//! Input value resolution
//!
//! Each declared input of a task takes the first value found among, in order:
//!
//! 1. the positional argument at its `argument-index`
//! 2. the named argument for its name, then for its short name
//! 3. configuration at `<caller>.<short>`, `<task>.<short>` and `<short>`
//! 4. its default (`env` defaults to the empty string)
//! 5. the output of the task that produces it, run at most once per run
//!
//! String values from arguments and configuration are then rendered against the caller's
//! scope and converted to the declared type. Defaults are used as declared, and the
//! output of a producing task is converted without being rendered.

use crate::config::ConfigStore;
use crate::error::{TaskError, TaskResult};
use crate::runner::{
    convert, split_path, Arguments, InputSpec, InputType, OutputCache, TaskDefinition,
    TaskName, TaskRegistry, TaskTemplate, Value,
};
use tracing::debug;

/// Runs a task on behalf of the resolver
pub trait Invoker {
    fn invoke(
        &self,
        name: &TaskName,
        args: &[String],
        named: &Arguments,
        scope: &Value,
        caller: Option<&TaskName>,
    ) -> TaskResult<String>;
}

/// Resolves the declared inputs of tasks within one run
pub struct InputResolver<'a> {
    registry: &'a TaskRegistry,
    config: &'a ConfigStore,
    cache: &'a OutputCache,
    invoker: &'a dyn Invoker,
}

impl<'a> InputResolver<'a> {
    pub fn new(
        registry: &'a TaskRegistry,
        config: &'a ConfigStore,
        cache: &'a OutputCache,
        invoker: &'a dyn Invoker,
    ) -> Self {
        InputResolver {
            registry,
            config,
            cache,
            invoker,
        }
    }

    /// Values of the inputs of `name` and of every enclosing namespace.
    ///
    /// A task's own values win over those of its ancestors. Ancestors see the same named
    /// arguments but no positional arguments and an empty scope.
    pub fn resolve_inherited(
        &self,
        name: &TaskName,
        args: &[String],
        named: &Arguments,
        scope: &Value,
        caller: Option<&TaskName>,
    ) -> TaskResult<Value> {
        let mut values = self
            .resolve_direct(name, args, named, scope, caller)
            .map_err(|e| e.in_inputs_of(&name.short_string()))?;

        if let Ok(parent) = name.parent() {
            let inherited =
                self.resolve_inherited(&parent, &[], named, &Value::object(), caller)?;
            values.merge_missing(inherited);
        }

        Ok(values)
    }

    /// Values of the inputs declared by `name` itself, as a tree keyed by input path
    pub fn resolve_direct(
        &self,
        name: &TaskName,
        args: &[String],
        named: &Arguments,
        scope: &Value,
        caller: Option<&TaskName>,
    ) -> TaskResult<Value> {
        let task = self.registry.find_task(name)?;
        debug!(
            task = %name,
            caller = %caller.map(TaskName::short_string).unwrap_or_default(),
            "collecting inputs"
        );

        let mut values = Value::object();
        for input in &task.inputs {
            debug!(task = %name, input = input.short_name(), "task depends on input");
            let value = self.resolve_input(task, input, args, named, scope, caller)?;
            values.set_path(&input.path(), value);
        }

        debug!(task = %name, values = %values, "finished collecting inputs");
        Ok(values)
    }

    fn resolve_input(
        &self,
        task: &TaskDefinition,
        input: &InputSpec,
        args: &[String],
        named: &Arguments,
        scope: &Value,
        caller: Option<&TaskName>,
    ) -> TaskResult<Value> {
        match self.provided_value(task, input, args, named, caller)? {
            Some(Provided::Expression(Value::String(expr))) => {
                let rendered = TaskTemplate::new(&task.name, scope).render(&expr, &input.name)?;
                let value = convert(&rendered, &input.input_type)?;
                debug!(input = %input.name, value = %value, "value after type conversion");
                Ok(value)
            }
            Some(Provided::Expression(value)) | Some(Provided::Final(value)) => Ok(value),
            None => match self.dependency_output(task, input, named)? {
                Value::String(output) => convert(&output, &input.input_type),
                other => Ok(other),
            },
        }
    }

    /// The first value supplied by arguments, configuration or defaults
    fn provided_value(
        &self,
        task: &TaskDefinition,
        input: &InputSpec,
        args: &[String],
        named: &Arguments,
        caller: Option<&TaskName>,
    ) -> TaskResult<Option<Provided>> {
        let short = input.short_name();

        if let Some(arg) = input.argument_index.and_then(|i| args.get(i)) {
            debug!(input = short, "found positional argument: {}", arg);
            return Ok(Some(Provided::Expression(Value::String(arg.clone()))));
        }

        if let Some(value) = named_value(named, &input.name, input) {
            return Ok(Some(Provided::Expression(value)));
        }

        if short != input.name {
            if let Some(value) = named_value(named, short, input) {
                return Ok(Some(Provided::Expression(value)));
            }
        }

        let mut keys = Vec::new();
        if let Some(caller) = caller {
            keys.push(format!("{}.{}", caller, short));
        }
        if !task.name.ends_with(&split_path(short)) {
            keys.push(format!("{}.{}", task.name, short));
        }
        keys.push(short.to_string());

        for key in keys {
            if let Some(value) = self.config.resolve(&key, &input.input_type) {
                debug!(input = short, key = %key, "found configuration value");
                return Ok(Some(Provided::Expression(value)));
            }
        }

        if let Some(default) = &input.default {
            return default_value(input, default).map(|value| Some(Provided::Final(value)));
        }

        if input.name == "env" {
            return Ok(Some(Provided::Final(Value::String(String::new()))));
        }

        Ok(None)
    }

    /// Output of the task producing `input`, from the cache or by running it
    fn dependency_output(
        &self,
        task: &TaskDefinition,
        input: &InputSpec,
        named: &Arguments,
    ) -> TaskResult<Value> {
        let path = input.path();

        if let Some(output) = self.cache.get(&path) {
            debug!(input = %input.name, "reusing cached task output");
            return Ok(output);
        }

        let dependency = self.registry.dependency_task(&task.name, input);
        debug!(
            task = %task.name,
            input = %input.name,
            dependency = %dependency,
            "running task to produce input"
        );

        let output = self
            .invoker
            .invoke(
                &dependency,
                &[],
                &named.sub_or_empty(&input.name),
                &Value::object(),
                Some(&task.name),
            )
            .map_err(|e| TaskError::MissingInput {
                input: input.short_name().to_string(),
                source: Box::new(e),
            })?;

        let output = Value::String(output);
        self.cache.insert(&path, output.clone());
        Ok(output)
    }
}

/// A value found for an input before falling back to the task producing it
enum Provided {
    /// Supplied by the caller or configuration; strings are rendered and converted
    Expression(Value),

    /// Used exactly as found
    Final(Value),
}

/// The named argument `key`. A nested argument tree only counts for object inputs; for
/// anything else it holds arguments meant for the task producing the input.
fn named_value(named: &Arguments, key: &str, input: &InputSpec) -> Option<Value> {
    named
        .get(key)
        .filter(|value| input.input_type == InputType::Object || value.as_object().is_none())
        .cloned()
}

/// The declared default of `input`, converted to its type
fn default_value(input: &InputSpec, default: &Value) -> TaskResult<Value> {
    let mismatch = || TaskError::TypeConversion {
        value: default.render(),
        type_name: input.input_type.to_string(),
        reason: format!("default of input `{}` is a {}", input.name, default.kind()),
    };

    match (&input.input_type, default) {
        (InputType::Unsupported(name), _) => Err(TaskError::UnsupportedInputType(name.clone())),
        (InputType::String, value) if value.is_scalar() => Ok(Value::String(value.render())),
        (InputType::Integer, Value::Integer(_))
        | (InputType::Boolean, Value::Boolean(_))
        | (InputType::Array, Value::Array(_))
        | (InputType::Object, Value::Object(_)) => Ok(default.clone()),
        (InputType::String, _) => Err(mismatch()),
        (input_type, Value::String(literal)) => convert(literal, input_type),
        _ => Err(mismatch()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_value_conversions() {
        let replicas = InputSpec::new("replicas").with_type(InputType::Integer);
        assert_eq!(
            default_value(&replicas, &Value::Integer(3)).unwrap(),
            Value::Integer(3)
        );
        assert_eq!(
            default_value(&replicas, &Value::from("4")).unwrap(),
            Value::Integer(4)
        );
        assert!(default_value(&replicas, &Value::Boolean(true)).is_err());

        let tags = InputSpec::new("tags").with_type(InputType::Array);
        assert_eq!(
            default_value(&tags, &Value::from(r#"["a","b"]"#)).unwrap(),
            Value::Array(vec![Value::from("a"), Value::from("b")])
        );

        let port = InputSpec::new("port");
        assert_eq!(
            default_value(&port, &Value::Integer(8080)).unwrap(),
            Value::from("8080")
        );

        let odd = InputSpec::new("odd").with_type(InputType::Unsupported("float".into()));
        assert!(matches!(
            default_value(&odd, &Value::from("1.5")),
            Err(TaskError::UnsupportedInputType(_))
        ));
    }
}
