//! Per-run memo of task outputs
//!
//! When an input has no value from any other source, the task producing it is run and its
//! output is stored at the input's dotted path. Later inputs asking for the same path in
//! the same run read the stored output instead of running the task again.

use crate::runner::Value;
use std::cell::RefCell;

/// Task outputs keyed by dotted path, scoped to one top-level run.
///
/// Single-threaded: lookups and inserts happen on the resolving thread, one at a time, and
/// no borrow is held across a task invocation.
#[derive(Debug, Default)]
pub struct OutputCache {
    outputs: RefCell<Value>,
}

impl OutputCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Option<Value> {
        self.outputs.borrow().get_path(path).cloned()
    }

    pub fn insert<S: AsRef<str>>(&self, path: &[S], output: Value) {
        self.outputs.borrow_mut().set_path(path, output);
    }
}
