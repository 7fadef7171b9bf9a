//! End-to-end resolution of a template's parameters and generated symbols.
//!
//! [`TemplateResolver::resolve`] turns parameter definitions, the values a
//! caller supplied, and the template's generated symbols into a
//! [`ResolvedTemplate`]:
//!
//! 1. one [`EvaluationRecord`] per parameter, falling back to the definition's
//!    default value;
//! 2. condition evaluation, or verification when the caller supplied
//!    condition results of its own;
//! 3. final precedence of every parameter;
//! 4. a check that every required parameter has a value;
//! 5. the variable snapshot of enabled parameters;
//! 6. dependency-ordered evaluation of the generated symbols.
//!
//! Nothing is shared between calls except the [`PortRegistry`], so one
//! resolver can serve concurrent resolutions.
//!
//! # Example
//!
//! ```rust,no_run
//! use scaffold_resolver::config::{ResolverSettings, TemplateManifest};
//! use scaffold_resolver::expression::ExpressionEvaluator;
//! use scaffold_resolver::macros::PortRegistry;
//! use scaffold_resolver::resolver::{ParameterInput, ParameterInputs, TemplateResolver};
//! use serde_json::json;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # fn example(evaluator: &dyn ExpressionEvaluator) -> anyhow::Result<()> {
//! let manifest = TemplateManifest::load(Path::new("template.json"))?;
//! let resolver =
//!     TemplateResolver::new(evaluator, Arc::new(PortRegistry::new()), ResolverSettings::default());
//!
//! let mut inputs = ParameterInputs::new();
//! inputs.insert("Framework".into(), ParameterInput::user(json!("net9")));
//! let resolved = resolver.resolve_manifest(&manifest, &inputs)?;
//! println!("{}", resolved.variables.clone().into_json());
//! # Ok(())
//! # }
//! ```

pub mod dependency_graph;

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::config::{ResolverSettings, TemplateManifest};
use crate::core::{ResolverError, Result};
use crate::expression::{ExpressionEvaluator, VariableMap};
use crate::macros::{GeneratedSymbol, MacroEvaluator, PortRegistry, sort_generated_symbols};
use crate::parameters::{
    ConditionCheckMode, DataSource, EvaluatedPrecedence, EvaluationRecord, InputDataState,
    InputValue, ParameterConditionEvaluator, ParameterDefinition,
};

pub use dependency_graph::{CycleError, DependencyGraph};

/// What a caller supplies for one parameter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterInput {
    pub value: InputValue,
    pub source: DataSource,
    /// Previously computed `isEnabled` result, checked against the condition.
    pub is_enabled_result: Option<bool>,
    /// Previously computed `isRequired` result, checked against the condition.
    pub is_required_result: Option<bool>,
}

impl ParameterInput {
    /// A value entered by the user.
    pub fn user(value: Value) -> Self {
        Self {
            value: InputValue::Set(value),
            source: DataSource::User,
            ..Self::default()
        }
    }

    /// An explicit null entered by the user.
    pub fn explicit_null() -> Self {
        Self {
            value: InputValue::ExplicitNull,
            source: DataSource::User,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: DataSource) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn with_condition_results(
        mut self,
        is_enabled_result: Option<bool>,
        is_required_result: Option<bool>,
    ) -> Self {
        self.is_enabled_result = is_enabled_result;
        self.is_required_result = is_required_result;
        self
    }
}

/// Caller inputs keyed by parameter name.
pub type ParameterInputs = BTreeMap<String, ParameterInput>;

/// Outcome for one parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedParameter {
    pub definition: ParameterDefinition,
    pub value: Option<Value>,
    pub data_source: DataSource,
    pub input_state: InputDataState,
    pub evaluated_precedence: EvaluatedPrecedence,
}

impl ResolvedParameter {
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub const fn is_enabled(&self) -> bool {
        self.evaluated_precedence.is_enabled()
    }
}

/// Result of a successful resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTemplate {
    /// Parameters in declared order.
    pub parameters: Vec<ResolvedParameter>,
    /// Generated symbols in evaluation order.
    pub symbols: Vec<GeneratedSymbol>,
    /// Values of enabled parameters and of every generated symbol.
    pub variables: VariableMap,
}

impl ResolvedTemplate {
    pub fn parameter(&self, name: &str) -> Option<&ResolvedParameter> {
        self.parameters.iter().find(|p| p.name() == name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn symbol_order(&self) -> Vec<&str> {
        self.symbols.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn disabled_parameters(&self) -> Vec<&str> {
        self.parameters.iter().filter(|p| !p.is_enabled()).map(ResolvedParameter::name).collect()
    }
}

/// Resolves templates against an external expression evaluator.
pub struct TemplateResolver<'a> {
    evaluator: &'a dyn ExpressionEvaluator,
    ports: Arc<PortRegistry>,
    settings: ResolverSettings,
}

impl<'a> TemplateResolver<'a> {
    pub fn new(
        evaluator: &'a dyn ExpressionEvaluator,
        ports: Arc<PortRegistry>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            evaluator,
            ports,
            settings,
        }
    }

    pub const fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub fn ports(&self) -> &Arc<PortRegistry> {
        &self.ports
    }

    /// Validate a manifest and resolve it.
    ///
    /// # Errors
    ///
    /// See [`TemplateManifest::validate`] and [`resolve`](Self::resolve).
    pub fn resolve_manifest(
        &self,
        manifest: &TemplateManifest,
        supplied: &ParameterInputs,
    ) -> Result<ResolvedTemplate> {
        manifest.validate()?;
        let definitions = manifest.parameter_definitions()?;
        self.resolve(&definitions, supplied, manifest.symbols.clone())
    }

    /// Resolve parameters and generated symbols.
    ///
    /// # Errors
    ///
    /// - [`ResolverError::DuplicateName`] when a name is declared twice
    /// - condition errors from [`ParameterConditionEvaluator`]
    /// - [`ResolverError::MissingRequiredParameters`] when a required
    ///   parameter has no value
    /// - [`ResolverError::SymbolCircle`] and [`ResolverError::MacroEvaluation`]
    ///   from generated symbols
    pub fn resolve(
        &self,
        definitions: &[ParameterDefinition],
        supplied: &ParameterInputs,
        symbols: Vec<GeneratedSymbol>,
    ) -> Result<ResolvedTemplate> {
        check_unique_names(definitions, &symbols)?;
        tracing::debug!(
            "Resolving {} parameters and {} generated symbols",
            definitions.len(),
            symbols.len()
        );

        let mut records = build_records(definitions, supplied)?;

        let mode = ConditionCheckMode::from_strict(self.settings.strict_consistency);
        ParameterConditionEvaluator::new(self.evaluator).evaluate_or_verify(&mut records, mode)?;

        let mut parameters = Vec::with_capacity(records.len());
        for record in &records {
            parameters.push(ResolvedParameter {
                definition: record.definition().clone(),
                value: record.value().cloned(),
                data_source: record.data_source(),
                input_state: record.input_state(),
                evaluated_precedence: record.evaluated_precedence()?,
            });
        }

        let missing: Vec<String> = parameters
            .iter()
            .filter(|p| p.evaluated_precedence == EvaluatedPrecedence::Required && p.value.is_none())
            .map(|p| p.name().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ResolverError::MissingRequiredParameters {
                names: missing,
            });
        }

        let mut variables: VariableMap = parameters
            .iter()
            .filter(|p| p.is_enabled())
            .filter_map(|p| p.value.clone().map(|v| (p.name().to_string(), v)))
            .collect();

        let parameter_names: Vec<&str> = definitions.iter().map(|d| d.name.as_str()).collect();
        let ordered = sort_generated_symbols(symbols, parameter_names.as_slice(), self.evaluator)?;
        MacroEvaluator::new(self.evaluator, Arc::clone(&self.ports), self.settings.clone())
            .evaluate_all(&ordered, &mut variables)?;

        let disabled = parameters.iter().filter(|p| !p.is_enabled()).count();
        tracing::debug!(
            "Resolved template: {} parameters ({} disabled), {} variables",
            parameters.len(),
            disabled,
            variables.len()
        );

        Ok(ResolvedTemplate {
            parameters,
            symbols: ordered,
            variables,
        })
    }
}

fn check_unique_names(definitions: &[ParameterDefinition], symbols: &[GeneratedSymbol]) -> Result<()> {
    let mut seen = HashSet::new();
    let names =
        definitions.iter().map(|d| d.name.as_str()).chain(symbols.iter().map(|s| s.name.as_str()));
    for name in names {
        if !seen.insert(name) {
            return Err(ResolverError::DuplicateName {
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

/// One record per definition. Unset inputs fall back to the default value.
fn build_records(
    definitions: &[ParameterDefinition],
    supplied: &ParameterInputs,
) -> Result<Vec<EvaluationRecord>> {
    for name in supplied.keys() {
        if !definitions.iter().any(|d| &d.name == name) {
            tracing::warn!("Ignoring input for undeclared parameter '{}'", name);
        }
    }

    let mut records = Vec::with_capacity(definitions.len());
    for definition in definitions {
        let input = supplied.get(&definition.name).cloned().unwrap_or_default();
        let record = match (&input.value, &definition.default_value) {
            (InputValue::Unset, Some(default)) => {
                EvaluationRecord::with_value(definition.clone(), default.clone(), DataSource::Default)
            }
            _ => EvaluationRecord::with_input(definition.clone(), input.value, input.source),
        };
        let record = if input.is_enabled_result.is_some() || input.is_required_result.is_some() {
            record.with_condition_results(input.is_enabled_result, input.is_required_result)?
        } else {
            record
        };
        records.push(record);
    }
    Ok(records)
}
