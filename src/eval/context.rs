use std::collections::HashMap;

use crate::value::Value;

use super::evaluator::{EvalError, EvalResult};

/// Per-template variable environment.
///
/// Created empty when a template's pass begins, mutated by every `/*py`
/// block and every `=`-form marker, and dropped when the pass ends. No
/// binding survives across files.
#[derive(Debug, Default)]
pub struct Environment {
    vars: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a name. Pre-existing bindings with the same name are
    /// overwritten, not merged.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    pub fn lookup(&self, name: &str) -> EvalResult<&Value> {
        self.vars
            .get(name)
            .ok_or_else(|| EvalError::UnboundIdentifier(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
