//! Structured configuration lookup
//!
//! Values for task inputs and task stubs can come from flag overrides (`--set key=value`)
//! or from the configuration document. Lookups never fail: an absent value tells the
//! caller to try its next source.

use crate::runner::{split_path, InputType, Map, Value};
use tracing::debug;

/// Read-only view of flag overrides and the configuration document
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    flags: Map,
    values: Value,
}

/// A nested mapping of the configuration document
#[derive(Debug, Clone, Copy)]
pub struct ConfigSection<'a> {
    values: &'a Map,
}

impl<'a> ConfigSection<'a> {
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.values.get(key)
    }
}

impl ConfigStore {
    pub fn new(values: Value) -> Self {
        ConfigStore {
            flags: Map::new(),
            values,
        }
    }

    /// Parse a YAML configuration document
    pub fn from_yaml_str(yaml: &str) -> crate::Result<Self> {
        Ok(ConfigStore::new(crate::config::parse_config_document(yaml)?))
    }

    /// Override `flags.<key>`
    pub fn set_flag(&mut self, key: &str, value: Value) {
        self.flags.insert(key.to_string(), value);
    }

    pub fn with_flag(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set_flag(key, value.into());
        self
    }

    /// The flag override for `key`, if any
    pub fn flag(&self, key: &str) -> Option<&Value> {
        self.flags.get(key)
    }

    /// Look up a dotted key in the configuration document
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get_path(&split_path(key))
    }

    /// The mapping at a dotted key, if there is one
    pub fn section(&self, name: &str) -> Option<ConfigSection<'_>> {
        self.get(name)
            .and_then(Value::as_object)
            .map(|values| ConfigSection { values })
    }

    /// Resolve a value for `key`, in order of precedence:
    ///
    /// 1. the flag override `flags.<key>`; strings verbatim, anything else only if it
    ///    has the expected type
    /// 2. for dotted keys, the leaf looked up in the section named by everything before
    ///    the last dot
    /// 3. the key in the configuration document; strings verbatim, anything else only if
    ///    it has the expected type
    pub fn resolve(&self, key: &str, expected: &InputType) -> Option<Value> {
        debug!(key, expected = %expected, "fetching configuration value");

        if let Some(flag) = self.flag(key) {
            if let Value::String(s) = flag {
                if !s.is_empty() {
                    return Some(flag.clone());
                }
            } else if let Some(value) = ensure_type(flag, expected) {
                return Some(value);
            } else {
                debug!(
                    key,
                    found = flag.kind(),
                    expected = %expected,
                    "ignoring flag of unexpected type"
                );
            }
        }

        if let Some((parent, leaf)) = key.rsplit_once('.') {
            if let Some(value) = self.section(parent).and_then(|s| s.get(leaf)) {
                debug!(key, section = parent, "found value in configuration section");
                return Some(value.clone());
            }
        }

        let raw = self.get(key)?;
        if raw.as_str().is_some() {
            return Some(raw.clone());
        }
        let typed = ensure_type(raw, expected);
        if typed.is_none() {
            debug!(
                key,
                found = raw.kind(),
                expected = %expected,
                "ignoring configuration value of unexpected type"
            );
        }
        typed
    }
}

/// `raw` if it natively has the `expected` type. Strings are never parsed here.
pub fn ensure_type(raw: &Value, expected: &InputType) -> Option<Value> {
    match (expected, raw) {
        (InputType::String, Value::String(_))
        | (InputType::Integer, Value::Integer(_))
        | (InputType::Boolean, Value::Boolean(_)) => Some(raw.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(yaml: &str) -> ConfigStore {
        ConfigStore::from_yaml_str(yaml).unwrap()
    }

    #[test]
    fn test_flag_wins_and_is_verbatim() {
        let store = store("deploy:\n  replicas: 2\n").with_flag("deploy.replicas", "5");
        assert_eq!(
            store.resolve("deploy.replicas", &InputType::Integer),
            Some(Value::from("5"))
        );
    }

    #[test]
    fn test_typed_flag_must_match() {
        let store = ConfigStore::default()
            .with_flag("count", 3)
            .with_flag("enabled", Value::Boolean(true));
        assert_eq!(
            store.resolve("count", &InputType::Integer),
            Some(Value::Integer(3))
        );
        assert_eq!(store.resolve("count", &InputType::Boolean), None);
        assert_eq!(
            store.resolve("enabled", &InputType::Boolean),
            Some(Value::Boolean(true))
        );
    }

    #[test]
    fn test_section_values_borrow_from_store() {
        let store = store("deploy:\n  region: eu-west-1\n");
        let region = {
            let section = store.section("deploy").unwrap();
            section.get("region")
        };
        assert_eq!(region, Some(&Value::from("eu-west-1")));
        assert!(store.section("region").is_none());
    }

    #[test]
    fn test_empty_flag_is_ignored() {
        let store = store("region: us-east-1\n").with_flag("region", "");
        assert_eq!(
            store.resolve("region", &InputType::String),
            Some(Value::from("us-east-1"))
        );
    }

    #[test]
    fn test_section_lookup_is_untyped() {
        let store = store("deploy:\n  replicas: 2\n  tags: [a, b]\n");
        assert_eq!(
            store.resolve("deploy.replicas", &InputType::String),
            Some(Value::Integer(2))
        );
        assert!(matches!(
            store.resolve("deploy.tags", &InputType::Array),
            Some(Value::Array(_))
        ));
    }

    #[test]
    fn test_flat_lookup_type_checks_non_strings() {
        let store = store("replicas: 3\nregion: us-east-1\nverbose: true\nratio: 0.5\n");
        assert_eq!(
            store.resolve("replicas", &InputType::Integer),
            Some(Value::Integer(3))
        );
        assert_eq!(store.resolve("replicas", &InputType::String), None);
        // strings are returned whatever the expected type
        assert_eq!(
            store.resolve("region", &InputType::Integer),
            Some(Value::from("us-east-1"))
        );
        assert_eq!(
            store.resolve("verbose", &InputType::Boolean),
            Some(Value::Boolean(true))
        );
        assert_eq!(store.resolve("ratio", &InputType::String), None);
        assert_eq!(
            store.resolve("missing", &InputType::String),
            None
        );
    }

    #[test]
    fn test_mapping_is_not_a_string() {
        let store = store("deploy:\n  region: us-east-1\n");
        assert_eq!(store.resolve("deploy", &InputType::String), None);
        assert!(store.section("deploy").is_some());
        assert!(store.section("deploy.region").is_none());
    }
}
