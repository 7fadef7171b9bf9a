//! Condition evaluation adapter.
//!
//! The expression language used by template conditions is owned by an external
//! evaluator, plugged in through [`ExpressionEvaluator`]. This module wraps it
//! so every evaluation also reports which variable names were read.
//!
//! References are discovered from an execution trace, not from parsing: the
//! evaluator is handed a [`VariableScope`] that records every lookup. A branch
//! skipped by short-circuit evaluation therefore contributes no references on
//! that pass. Callers re-evaluate with a fresh trace whenever the snapshot
//! changes, so the references always describe the path actually taken.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Read access to the variables visible to an expression.
pub trait VariableScope {
    /// Look up a variable by name. Absent variables return `None`.
    fn lookup(&self, name: &str) -> Option<&Value>;
}

/// Failure reported by the external expression evaluator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct EvaluatorError {
    pub message: String,
}

impl EvaluatorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The external condition-language evaluator.
///
/// Implementations must read variables exclusively through `scope`; that is
/// how references are discovered.
pub trait ExpressionEvaluator: Send + Sync {
    /// Evaluate `expression` against `scope` and return its value.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluatorError`] for malformed or un-evaluable expressions.
    fn evaluate(&self, expression: &str, scope: &dyn VariableScope)
    -> Result<Value, EvaluatorError>;
}

/// Snapshot of variable values, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableMap {
    values: BTreeMap<String, Value>,
}

impl VariableMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(name.into(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// The value rendered as text: strings verbatim, null as empty, anything
    /// else as its JSON form.
    pub fn get_string(&self, name: &str) -> Option<String> {
        self.get(name).map(value_to_string)
    }

    /// Consume the map into a JSON object.
    pub fn into_json(self) -> Value {
        Value::Object(self.values.into_iter().collect())
    }
}

impl VariableScope for VariableMap {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for VariableMap {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Render a value as text the way templates see it.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Scope wrapper that records every name looked up through it.
struct RecordingScope<'a> {
    inner: &'a dyn VariableScope,
    touched: RefCell<BTreeSet<String>>,
}

impl<'a> RecordingScope<'a> {
    fn new(inner: &'a dyn VariableScope) -> Self {
        Self {
            inner,
            touched: RefCell::new(BTreeSet::new()),
        }
    }

    fn into_touched(self) -> BTreeSet<String> {
        self.touched.into_inner()
    }
}

impl VariableScope for RecordingScope<'_> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.touched.borrow_mut().insert(name.to_string());
        self.inner.lookup(name)
    }
}

/// Boolean result of a condition plus the names read while computing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionOutcome {
    pub result: bool,
    pub referenced: BTreeSet<String>,
}

/// Value result of an expression plus the names read while computing it.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueOutcome {
    pub value: Value,
    pub referenced: BTreeSet<String>,
}

/// Thin adapter over an [`ExpressionEvaluator`] that traces variable reads.
#[derive(Clone, Copy)]
pub struct ConditionAdapter<'a> {
    evaluator: &'a dyn ExpressionEvaluator,
}

impl<'a> ConditionAdapter<'a> {
    pub fn new(evaluator: &'a dyn ExpressionEvaluator) -> Self {
        Self {
            evaluator,
        }
    }

    /// Evaluate an expression for its value.
    ///
    /// # Errors
    ///
    /// Propagates the evaluator's error.
    pub fn evaluate_value(
        &self,
        expression: &str,
        scope: &dyn VariableScope,
    ) -> Result<ValueOutcome, EvaluatorError> {
        let recording = RecordingScope::new(scope);
        let value = self.evaluator.evaluate(expression, &recording)?;
        Ok(ValueOutcome {
            value,
            referenced: recording.into_touched(),
        })
    }

    /// Evaluate an expression as a boolean condition.
    ///
    /// # Errors
    ///
    /// Propagates the evaluator's error, or reports a result that has no
    /// boolean interpretation.
    pub fn evaluate_condition(
        &self,
        expression: &str,
        scope: &dyn VariableScope,
    ) -> Result<ConditionOutcome, EvaluatorError> {
        let outcome = self.evaluate_value(expression, scope)?;
        let result = truthiness(&outcome.value).ok_or_else(|| {
            EvaluatorError::new(format!(
                "expression '{expression}' produced {} which is not a boolean",
                outcome.value
            ))
        })?;
        Ok(ConditionOutcome {
            result,
            referenced: outcome.referenced,
        })
    }

    /// Names read while evaluating `expression`, whether or not the
    /// evaluation itself succeeded.
    pub fn trace_references(&self, expression: &str, scope: &dyn VariableScope) -> BTreeSet<String> {
        let recording = RecordingScope::new(scope);
        if let Err(e) = self.evaluator.evaluate(expression, &recording) {
            tracing::debug!("Evaluation of '{}' failed while tracing references: {}", expression, e);
        }
        recording.into_touched()
    }
}

/// Boolean interpretation of an evaluator result.
pub fn truthiness(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Null => Some(false),
        Value::Number(n) => Some(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}
