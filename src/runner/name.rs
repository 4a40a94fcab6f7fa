//! Hierarchical task names
//!
//! Tasks live in a dot-separated namespace: `build.image` is the `image` task inside
//! the `build` namespace, and `build` is its parent.

use crate::error::NoParent;
use std::fmt;

/// A dotted, hierarchical task name such as `build.image`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskName {
    segments: Vec<String>,
}

impl TaskName {
    /// Parse a dotted name. Empty segments are dropped, so `a..b` equals `a.b`.
    pub fn parse(name: &str) -> Self {
        TaskName {
            segments: name
                .split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TaskName {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// The name of `short` (itself possibly dotted) inside the namespace `self`
    pub fn join(&self, short: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(TaskName::parse(short).segments);
        TaskName { segments }
    }

    /// Canonical dotted form
    pub fn short_string(&self) -> String {
        self.segments.join(".")
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment, or the empty string for an empty name
    pub fn leaf(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The enclosing namespace. Single-segment names are namespace roots and have none.
    pub fn parent(&self) -> Result<TaskName, NoParent> {
        if self.segments.len() < 2 {
            return Err(NoParent);
        }
        Ok(TaskName {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Every enclosing namespace, innermost first, ending with the empty root namespace
    pub fn namespaces(&self) -> Vec<TaskName> {
        (0..self.segments.len())
            .rev()
            .map(|n| TaskName {
                segments: self.segments[..n].to_vec(),
            })
            .collect()
    }

    /// Whether the trailing segments of this name are exactly `suffix`
    pub fn ends_with(&self, suffix: &[&str]) -> bool {
        !suffix.is_empty()
            && suffix.len() <= self.segments.len()
            && self.segments[self.segments.len() - suffix.len()..]
                .iter()
                .zip(suffix)
                .all(|(a, b)| a == b)
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_string())
    }
}

impl From<&str> for TaskName {
    fn from(name: &str) -> Self {
        TaskName::parse(name)
    }
}
