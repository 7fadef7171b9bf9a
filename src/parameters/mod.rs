//! Parameter model and condition-driven precedence resolution.
//!
//! A template declares [`ParameterDefinition`]s. Each carries a
//! [`PrecedenceRule`] that may make the parameter's requiredness or enablement
//! depend on conditions over other parameters. For one invocation the caller
//! builds an [`EvaluationRecord`] per parameter holding its value and where the
//! value came from; [`conditions::ParameterConditionEvaluator`] fills in the
//! condition results and [`precedence::evaluate_precedence`] maps them to the
//! final [`EvaluatedPrecedence`].
//!
//! The record model guarantees by construction that:
//! - an explicit three-state input distinguishes "no value" from "explicit null";
//! - condition result presence mirrors condition string presence on the rule.
//!
//! Both are checked whenever values come from outside the crate, and violations
//! are reported as internal errors rather than template-authoring errors.

pub mod conditions;
pub mod precedence;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::core::{ResolverError, Result};

pub use conditions::{ConditionCheckMode, ParameterConditionEvaluator};
pub use precedence::{EvaluatedPrecedence, evaluate_precedence};

/// Template-authored classification of a parameter's requiredness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrecedenceDefinition {
    Required,
    ConditionallyRequired,
    Optional,
    Implicit,
    ConditionallyDisabled,
    Disabled,
}

/// Precedence rule with its optional conditions.
///
/// Invariants, checked by [`PrecedenceRule::new`]:
/// - `is_enabled_condition` is present exactly when the definition is
///   [`PrecedenceDefinition::ConditionallyDisabled`];
/// - a definition of [`PrecedenceDefinition::ConditionallyRequired`] has an
///   `is_required_condition`, and a requirement condition only appears on
///   `ConditionallyRequired` or `ConditionallyDisabled` rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrecedenceRule {
    definition: PrecedenceDefinition,
    is_required_condition: Option<String>,
    is_enabled_condition: Option<String>,
    is_required: bool,
}

impl PrecedenceRule {
    /// Build a validated rule.
    ///
    /// `parameter` is only used to name the culprit in errors. Empty condition
    /// strings count as absent.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::InvalidPrecedence`] when the conditions do not
    /// match the definition.
    pub fn new(
        parameter: &str,
        definition: PrecedenceDefinition,
        is_required_condition: Option<String>,
        is_enabled_condition: Option<String>,
        is_required: bool,
    ) -> Result<Self> {
        let is_required_condition = is_required_condition.filter(|c| !c.trim().is_empty());
        let is_enabled_condition = is_enabled_condition.filter(|c| !c.trim().is_empty());
        let invalid = |reason: &str| ResolverError::InvalidPrecedence {
            parameter: parameter.to_string(),
            reason: reason.to_string(),
        };

        let conditionally_disabled = definition == PrecedenceDefinition::ConditionallyDisabled;
        if is_enabled_condition.is_some() != conditionally_disabled {
            return Err(invalid(
                "an isEnabled condition must be present exactly when the precedence is ConditionallyDisabled",
            ));
        }
        match (definition, is_required_condition.is_some()) {
            (PrecedenceDefinition::ConditionallyRequired, false) => {
                return Err(invalid("ConditionallyRequired precedence needs an isRequired condition"));
            }
            (
                PrecedenceDefinition::ConditionallyRequired
                | PrecedenceDefinition::ConditionallyDisabled,
                true,
            )
            | (_, false) => {}
            (_, true) => {
                return Err(invalid(
                    "an isRequired condition is only allowed on ConditionallyRequired or ConditionallyDisabled precedence",
                ));
            }
        }

        Ok(Self {
            definition,
            is_required_condition,
            is_enabled_condition,
            is_required,
        })
    }

    /// Unconditional rule. Conditional definitions are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::InvalidPrecedence`] for conditional definitions.
    pub fn unconditional(parameter: &str, definition: PrecedenceDefinition) -> Result<Self> {
        Self::new(parameter, definition, None, None, false)
    }

    pub fn required() -> Self {
        Self::fixed(PrecedenceDefinition::Required)
    }

    pub fn optional() -> Self {
        Self::fixed(PrecedenceDefinition::Optional)
    }

    pub fn implicit() -> Self {
        Self::fixed(PrecedenceDefinition::Implicit)
    }

    pub fn disabled() -> Self {
        Self::fixed(PrecedenceDefinition::Disabled)
    }

    fn fixed(definition: PrecedenceDefinition) -> Self {
        Self {
            definition,
            is_required_condition: None,
            is_enabled_condition: None,
            is_required: false,
        }
    }

    /// `ConditionallyRequired` rule with the given condition.
    pub fn conditionally_required(condition: impl Into<String>) -> Self {
        Self {
            definition: PrecedenceDefinition::ConditionallyRequired,
            is_required_condition: Some(condition.into()),
            is_enabled_condition: None,
            is_required: false,
        }
    }

    /// `ConditionallyDisabled` rule with the given enablement condition.
    pub fn conditionally_disabled(enabled_condition: impl Into<String>) -> Self {
        Self {
            definition: PrecedenceDefinition::ConditionallyDisabled,
            is_required_condition: None,
            is_enabled_condition: Some(enabled_condition.into()),
            is_required: false,
        }
    }

    /// Mark a conditionally disabled parameter as required whenever it is enabled.
    #[must_use]
    pub fn with_required_flag(mut self, is_required: bool) -> Self {
        self.is_required = is_required;
        self
    }

    pub const fn definition(&self) -> PrecedenceDefinition {
        self.definition
    }

    pub fn is_required_condition(&self) -> Option<&str> {
        self.is_required_condition.as_deref()
    }

    pub fn is_enabled_condition(&self) -> Option<&str> {
        self.is_enabled_condition.as_deref()
    }

    pub const fn is_required(&self) -> bool {
        self.is_required
    }

    pub fn has_conditions(&self) -> bool {
        self.is_required_condition.is_some() || self.is_enabled_condition.is_some()
    }
}

/// Immutable parameter declaration. Identity is the name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDefinition {
    pub name: String,
    pub data_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    pub precedence: PrecedenceRule,
}

impl ParameterDefinition {
    /// String-typed parameter with the given precedence.
    pub fn new(name: impl Into<String>, precedence: PrecedenceRule) -> Self {
        Self {
            name: name.into(),
            data_type: "string".to_string(),
            default_value: None,
            choices: Vec::new(),
            precedence,
        }
    }

    #[must_use]
    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = data_type.into();
        self
    }

    #[must_use]
    pub fn with_default(mut self, default_value: Value) -> Self {
        self.default_value = Some(default_value);
        self
    }

    #[must_use]
    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }
}

/// Where a parameter's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataSource {
    #[default]
    None,
    Default,
    HostDefault,
    HostParameter,
    User,
    NameParameter,
}

/// Tag of an [`InputValue`], used when values arrive as separate fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputDataState {
    Set,
    Unset,
    ExplicitNull,
}

impl fmt::Display for InputDataState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InputDataState::Set => "set",
            InputDataState::Unset => "unset",
            InputDataState::ExplicitNull => "explicitNull",
        };
        f.write_str(label)
    }
}

/// A parameter's input: a non-null value, nothing at all, or an explicit null.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InputValue {
    Set(Value),
    #[default]
    Unset,
    ExplicitNull,
}

impl InputValue {
    pub const fn state(&self) -> InputDataState {
        match self {
            InputValue::Set(_) => InputDataState::Set,
            InputValue::Unset => InputDataState::Unset,
            InputValue::ExplicitNull => InputDataState::ExplicitNull,
        }
    }

    /// The value visible to conditions, if any.
    pub const fn value(&self) -> Option<&Value> {
        match self {
            InputValue::Set(value) => Some(value),
            _ => None,
        }
    }
}

/// Mutable per-invocation state of one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRecord {
    definition: ParameterDefinition,
    input: InputValue,
    data_source: DataSource,
    is_enabled_result: Option<bool>,
    is_required_result: Option<bool>,
}

impl EvaluationRecord {
    /// Record with no value and no condition results.
    pub fn new(definition: ParameterDefinition) -> Self {
        Self {
            definition,
            input: InputValue::Unset,
            data_source: DataSource::None,
            is_enabled_result: None,
            is_required_result: None,
        }
    }

    /// Record holding the given input.
    ///
    /// A `Set` input holding JSON null is normalised to `ExplicitNull`.
    pub fn with_input(definition: ParameterDefinition, input: InputValue, source: DataSource) -> Self {
        let input = match input {
            InputValue::Set(Value::Null) => InputValue::ExplicitNull,
            other => other,
        };
        Self {
            definition,
            input,
            data_source: source,
            is_enabled_result: None,
            is_required_result: None,
        }
    }

    /// Record holding a value.
    pub fn with_value(definition: ParameterDefinition, value: Value, source: DataSource) -> Self {
        Self::with_input(definition, InputValue::Set(value), source)
    }

    /// Build a record from separately supplied value and state.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::InvalidInputState`] when the state does not
    /// match the value: `Unset` and `ExplicitNull` need no value (or null),
    /// `Set` needs a non-null value.
    pub fn from_parts(
        definition: ParameterDefinition,
        value: Option<Value>,
        state: InputDataState,
        source: DataSource,
    ) -> Result<Self> {
        let input = match (state, value) {
            (InputDataState::Set, Some(value)) if !value.is_null() => InputValue::Set(value),
            (InputDataState::Unset, None | Some(Value::Null)) => InputValue::Unset,
            (InputDataState::ExplicitNull, None | Some(Value::Null)) => InputValue::ExplicitNull,
            (state, _) => {
                return Err(ResolverError::InvalidInputState {
                    parameter: definition.name.clone(),
                    state: state.to_string(),
                });
            }
        };
        Ok(Self::with_input(definition, input, source))
    }

    /// Attach condition results computed elsewhere (for instance by a host
    /// reusing an earlier evaluation).
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::ConditionResultPresence`] when a result is
    /// present without its condition or missing for a present condition.
    pub fn with_condition_results(
        mut self,
        is_enabled_result: Option<bool>,
        is_required_result: Option<bool>,
    ) -> Result<Self> {
        self.is_enabled_result = is_enabled_result;
        self.is_required_result = is_required_result;
        self.check_condition_presence()?;
        Ok(self)
    }

    /// Verify that condition results are present exactly when conditions are.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::ConditionResultPresence`] naming the parameter
    /// and the offending condition.
    pub fn check_condition_presence(&self) -> Result<()> {
        let precedence = &self.definition.precedence;
        if self.is_enabled_result.is_some() != precedence.is_enabled_condition().is_some() {
            return Err(ResolverError::ConditionResultPresence {
                parameter: self.definition.name.clone(),
                condition: "isEnabled",
            });
        }
        if self.is_required_result.is_some() != precedence.is_required_condition().is_some() {
            return Err(ResolverError::ConditionResultPresence {
                parameter: self.definition.name.clone(),
                condition: "isRequired",
            });
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub const fn definition(&self) -> &ParameterDefinition {
        &self.definition
    }

    pub const fn precedence(&self) -> &PrecedenceRule {
        &self.definition.precedence
    }

    pub const fn input(&self) -> &InputValue {
        &self.input
    }

    pub const fn input_state(&self) -> InputDataState {
        self.input.state()
    }

    pub const fn value(&self) -> Option<&Value> {
        self.input.value()
    }

    pub const fn data_source(&self) -> DataSource {
        self.data_source
    }

    pub const fn is_enabled_result(&self) -> Option<bool> {
        self.is_enabled_result
    }

    pub const fn is_required_result(&self) -> Option<bool> {
        self.is_required_result
    }

    pub(crate) fn set_is_enabled_result(&mut self, result: bool) {
        self.is_enabled_result = Some(result);
    }

    pub(crate) fn set_is_required_result(&mut self, result: bool) {
        self.is_required_result = Some(result);
    }

    pub(crate) fn clear_condition_results(&mut self) {
        self.is_enabled_result = None;
        self.is_required_result = None;
    }

    /// Whether condition results have been computed or supplied.
    pub fn has_condition_results(&self) -> bool {
        self.is_enabled_result.is_some() || self.is_required_result.is_some()
    }

    /// Final precedence for this record.
    ///
    /// # Errors
    ///
    /// See [`evaluate_precedence`].
    pub fn evaluated_precedence(&self) -> Result<EvaluatedPrecedence> {
        evaluate_precedence(self)
    }
}
