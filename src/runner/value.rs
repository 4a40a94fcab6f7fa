//! Typed variable trees
//!
//! Inputs, configuration documents, named arguments and cached task outputs are all
//! trees of [`Value`]. Nested entries are addressed by paths, usually produced by
//! splitting a dotted name such as `build.artifact.digest`.

use std::collections::BTreeMap;
use std::fmt;

/// Object node of a value tree
pub type Map = BTreeMap<String, Value>;

/// A dynamically typed value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    /// Only produced when loading documents that contain decimals
    Float(f64),
    Boolean(bool),
    Array(Vec<Value>),
    Object(Map),
}

impl Value {
    /// An empty object
    pub fn object() -> Self {
        Value::Object(Map::new())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Array(_) | Value::Object(_))
    }

    /// Name of the variant, as used in log and error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Float(_) => "number",
            Value::Boolean(_) => "boolean",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Look up a nested value
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        let mut current = self;
        for key in path {
            current = current.as_object()?.get(key.as_ref())?;
        }
        Some(current)
    }

    /// Store `value` at `path`, creating intermediate objects.
    ///
    /// A scalar found where an intermediate object is needed is replaced. An empty path
    /// replaces the whole tree.
    pub fn set_path<S: AsRef<str>>(&mut self, path: &[S], value: Value) {
        let Some((last, parents)) = path.split_last() else {
            *self = value;
            return;
        };

        let mut current = self;
        for key in parents {
            current = object_mut(current)
                .entry(key.as_ref().to_string())
                .or_insert_with(Value::object);
        }
        object_mut(current).insert(last.as_ref().to_string(), value);
    }

    /// Deep-merge `other` underneath `self`: keys already present in `self` win, and
    /// objects present on both sides are merged recursively.
    pub fn merge_missing(&mut self, other: Value) {
        if let (Value::Object(mine), Value::Object(theirs)) = (self, other) {
            for (key, value) in theirs {
                match mine.get_mut(&key) {
                    Some(existing) => existing.merge_missing(value),
                    None => {
                        mine.insert(key, value);
                    }
                }
            }
        }
    }

    /// Flatten into dotted keys.
    ///
    /// Every object node gets an entry of its own as well as entries for its children, so
    /// an object-typed input stays addressable by its name. Arrays are kept whole.
    pub fn flatten(&self) -> Map {
        let mut flat = Map::new();
        if let Value::Object(map) = self {
            for (key, value) in map {
                flatten_into(&mut flat, key, value);
            }
        }
        flat
    }

    /// Text used when a value is substituted into a template or emitted as task output
    pub fn render(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Array(_) | Value::Object(_) => serde_json::Value::from(self).to_string(),
        }
    }

    /// Convert a YAML document. Nulls are treated as absent.
    pub fn from_yaml(yaml: serde_yaml::Value) -> Option<Value> {
        use serde_yaml::Value as Yaml;

        match yaml {
            Yaml::Null => None,
            Yaml::Bool(b) => Some(Value::Boolean(b)),
            Yaml::Number(n) => Some(match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            }),
            Yaml::String(s) => Some(Value::String(s)),
            Yaml::Sequence(seq) => Some(Value::Array(
                seq.into_iter().filter_map(Value::from_yaml).collect(),
            )),
            Yaml::Mapping(mapping) => {
                let mut map = Map::new();
                for (key, value) in mapping {
                    let key = match key {
                        Yaml::String(s) => s,
                        Yaml::Bool(b) => b.to_string(),
                        Yaml::Number(n) => n.to_string(),
                        _ => continue,
                    };
                    if let Some(value) = Value::from_yaml(value) {
                        map.insert(key, value);
                    }
                }
                Some(Value::Object(map))
            }
            Yaml::Tagged(tagged) => Value::from_yaml(tagged.value),
        }
    }

    /// Convert a JSON document. Nulls are treated as absent.
    pub fn from_json(json: serde_json::Value) -> Option<Value> {
        use serde_json::Value as Json;

        match json {
            Json::Null => None,
            Json::Bool(b) => Some(Value::Boolean(b)),
            Json::Number(n) => Some(match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            }),
            Json::String(s) => Some(Value::String(s)),
            Json::Array(items) => Some(Value::Array(
                items.into_iter().filter_map(Value::from_json).collect(),
            )),
            Json::Object(map) => Some(Value::Object(
                map.into_iter()
                    .filter_map(|(k, v)| Value::from_json(v).map(|v| (k, v)))
                    .collect(),
            )),
        }
    }
}

/// Borrow `value` as an object, replacing it with an empty one if it is anything else
fn object_mut(value: &mut Value) -> &mut Map {
    if !matches!(value, Value::Object(_)) {
        *value = Value::object();
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with an object"),
    }
}

fn flatten_into(flat: &mut Map, prefix: &str, value: &Value) {
    flat.insert(prefix.to_string(), value.clone());
    if let Value::Object(map) = value {
        for (key, child) in map {
            flatten_into(flat, &format!("{}.{}", prefix, key), child);
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::object()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(map)
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Named arguments given to a task, keyed by (possibly dotted) input name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    tree: Value,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an argument; dotted names create nested entries
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.tree.set_path(&split_path(name), value.into());
    }

    /// Builder form of [`Arguments::set`]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.tree.get_path(&split_path(name))
    }

    /// The arguments nested under `name`, or none at all
    pub fn sub_or_empty(&self, name: &str) -> Arguments {
        match self.get(name) {
            Some(sub @ Value::Object(_)) => Arguments { tree: sub.clone() },
            _ => Arguments::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tree.as_object().map_or(true, Map::is_empty)
    }
}

/// Split a dotted name into path segments
pub fn split_path(name: &str) -> Vec<&str> {
    name.split('.').collect()
}
