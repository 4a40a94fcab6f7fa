//! Variable interpolation for strings
//!
//! This module handles parsing and replacing variables in strings using the `${var}`
//! syntax. Variable names may be dotted to reach into nested values (`${build.tag}`).

use crate::error::{InterpolationError, InterpolationResult};
use crate::runner::{split_path, Value};
use regex::Regex;
use std::env;
use std::sync::OnceLock;

/// Passes after which interpolation is considered recursive
const MAX_PASSES: usize = 32;

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("interpolation pattern is valid"))
}

fn lookup(name: &str, vars: &Value) -> Option<String> {
    if let Some(value) = vars.get_path(&split_path(name)) {
        return Some(value.render());
    }
    env::var(name).ok()
}

/// Interpolate variables in a string
///
/// Supports:
/// - `${var}` and `${nested.var}` - variable from `vars`
/// - Environment variables (when not found in `vars`)
///
/// Undefined variables are left as they are.
pub fn interpolate(s: &str, vars: &Value) -> InterpolationResult<String> {
    let mut result = s.to_string();

    // Loop to handle values that themselves contain variables
    for _ in 0..MAX_PASSES {
        let mut changed = false;

        let next = pattern()
            .replace_all(&result, |caps: &regex::Captures| {
                let var_name = caps[1].trim();
                match lookup(var_name, vars) {
                    Some(value) => {
                        changed = true;
                        value
                    }
                    None => caps[0].to_string(),
                }
            })
            .into_owned();

        if !changed || next == result {
            return Ok(next);
        }
        result = next;
    }

    Err(InterpolationError::RecursiveInterpolation)
}

/// Interpolate with strict mode - errors on undefined variables
pub fn interpolate_strict(s: &str, vars: &Value) -> InterpolationResult<String> {
    let result = interpolate(s, vars)?;

    // Check if there are any remaining ${} patterns
    if let Some(caps) = pattern().captures(&result) {
        return Err(InterpolationError::UndefinedVariable(caps[1].to_string()));
    }

    if let Some(start) = result.find("${") {
        if !result[start..].contains('}') {
            return Err(InterpolationError::InvalidSyntax(format!(
                "unterminated `${{` in {:?}",
                s
            )));
        }
    }

    Ok(result)
}

/// Interpolate a list of strings
pub fn interpolate_list(list: &[String], vars: &Value) -> InterpolationResult<Vec<String>> {
    list.iter()
        .map(|s| interpolate(s, vars))
        .collect::<InterpolationResult<Vec<String>>>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Value {
        let mut vars = Value::object();
        for (k, v) in pairs {
            vars.set_path(&split_path(k), Value::from(*v));
        }
        vars
    }

    #[test]
    fn test_simple_interpolation() {
        let vars = vars(&[("name", "world")]);
        let result = interpolate("Hello, ${name}!", &vars).unwrap();
        assert_eq!(result, "Hello, world!");
    }

    #[test]
    fn test_repeated_and_multiple_variables() {
        let vars = vars(&[("first", "John"), ("last", "Doe")]);
        let result = interpolate("${first} ${last}, ${first}", &vars).unwrap();
        assert_eq!(result, "John Doe, John");
    }

    #[test]
    fn test_dotted_variable() {
        let vars = vars(&[("build.artifact.digest", "sha256:abc")]);
        let result = interpolate("image@${build.artifact.digest}", &vars).unwrap();
        assert_eq!(result, "image@sha256:abc");
    }

    #[test]
    fn test_typed_values_render() {
        let mut vars = Value::object();
        vars.set_path(&["replicas"], Value::Integer(3));
        vars.set_path(&["args"], Value::Array(vec![Value::from("a")]));
        let result = interpolate("${replicas} ${args}", &vars).unwrap();
        assert_eq!(result, r#"3 ["a"]"#);
    }

    #[test]
    fn test_environment_variable() {
        env::set_var("TEST_VAR_DOTRUN", "test_value");

        let result = interpolate("Value: ${TEST_VAR_DOTRUN}", &Value::object()).unwrap();
        assert_eq!(result, "Value: test_value");

        env::remove_var("TEST_VAR_DOTRUN");
    }

    #[test]
    fn test_undefined_variable_lenient() {
        let result = interpolate("Hello, ${undefined_dotrun}!", &Value::object()).unwrap();
        assert_eq!(result, "Hello, ${undefined_dotrun}!");
    }

    #[test]
    fn test_undefined_variable_strict() {
        let result = interpolate_strict("Hello, ${undefined_dotrun}!", &Value::object());
        assert!(matches!(
            result,
            Err(InterpolationError::UndefinedVariable(name)) if name == "undefined_dotrun"
        ));
    }

    #[test]
    fn test_unterminated_strict() {
        let result = interpolate_strict("Hello, ${name", &Value::object());
        assert!(matches!(result, Err(InterpolationError::InvalidSyntax(_))));
    }

    #[test]
    fn test_nested_interpolation() {
        let vars = vars(&[("inner", "value"), ("outer", "${inner}")]);
        let result = interpolate("Result: ${outer}", &vars).unwrap();
        assert_eq!(result, "Result: value");
    }

    #[test]
    fn test_recursive_interpolation() {
        let vars = vars(&[("loop", "x${loop}")]);
        let result = interpolate("${loop}", &vars);
        assert!(matches!(
            result,
            Err(InterpolationError::RecursiveInterpolation)
        ));
    }

    #[test]
    fn test_no_interpolation() {
        let result = interpolate("No variables here", &Value::object()).unwrap();
        assert_eq!(result, "No variables here");
    }

    #[test]
    fn test_interpolate_list() {
        let vars = vars(&[("name", "test")]);
        let list = vec!["file-${name}.txt".to_string(), "static.txt".to_string()];

        let result = interpolate_list(&list, &vars).unwrap();
        assert_eq!(result[0], "file-test.txt");
        assert_eq!(result[1], "static.txt");
    }

    #[test]
    fn test_empty_variable_name() {
        let result = interpolate("Value: ${}", &Value::object()).unwrap();
        // Should leave it unchanged
        assert_eq!(result, "Value: ${}");
    }
}
