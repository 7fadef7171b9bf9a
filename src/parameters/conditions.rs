//! Evaluation of parameter enablement and requirement conditions.
//!
//! Evaluation happens in two phases over one snapshot of parameter values.
//!
//! **Enablement.** Every `isEnabled` condition is evaluated once against the
//! values of all parameters. The variable reads traced during that pass become
//! dependency edges between parameters. Parameters that came out disabled are
//! the seeds of a cascade: their values are withdrawn from the snapshot and
//! every parameter that transitively depends on them is re-evaluated in
//! dependency order. A parameter disabled during the cascade withdraws its own
//! value before its dependents are reached. The set to recompute is the full
//! transitive closure computed up front, so the graph is never rebuilt.
//!
//! A cycle inside the recomputed set makes the outcome order-dependent and is
//! reported as a template-authoring error. A cycle elsewhere in the graph is
//! harmless for the current values and only logged.
//!
//! **Requirement.** Every `isRequired` condition is evaluated once against the
//! snapshot left by the enablement phase. There is no cascade.
//!
//! Hosts that reuse previously computed results can have them verified with
//! [`ParameterConditionEvaluator::verify_supplied_results`].

use std::collections::HashMap;

use super::EvaluationRecord;
use crate::core::{ConditionMismatch, ResolverError, Result};
use crate::expression::{ConditionAdapter, ConditionOutcome, ExpressionEvaluator, VariableMap};
use crate::resolver::dependency_graph::DependencyGraph;

/// How disagreement between supplied and recomputed condition results is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConditionCheckMode {
    /// Mismatches fail evaluation.
    #[default]
    Strict,
    /// Mismatches are logged and the supplied results are kept.
    Lenient,
}

impl ConditionCheckMode {
    pub const fn from_strict(strict: bool) -> Self {
        if strict {
            ConditionCheckMode::Strict
        } else {
            ConditionCheckMode::Lenient
        }
    }
}

/// Computes `isEnabled` and `isRequired` results for a parameter set.
pub struct ParameterConditionEvaluator<'a> {
    adapter: ConditionAdapter<'a>,
}

impl<'a> ParameterConditionEvaluator<'a> {
    pub fn new(evaluator: &'a dyn ExpressionEvaluator) -> Self {
        Self {
            adapter: ConditionAdapter::new(evaluator),
        }
    }

    /// Run both phases and store the results on the records.
    ///
    /// Existing results are overwritten. Returns the variable snapshot left
    /// after the enablement phase, which excludes disabled parameters.
    ///
    /// # Errors
    ///
    /// - [`ResolverError::MalformedCondition`] when a condition cannot be evaluated
    /// - [`ResolverError::CircularParameterDependency`] when a disablement has to
    ///   be propagated through a cycle
    pub fn evaluate(&self, records: &mut [EvaluationRecord]) -> Result<VariableMap> {
        for record in records.iter_mut() {
            record.clear_condition_results();
        }

        let mut variables = initial_variables(records);
        self.evaluate_enablement(records, &mut variables)?;
        self.evaluate_requirement(records, &variables)?;
        Ok(variables)
    }

    fn evaluate_enablement(
        &self,
        records: &mut [EvaluationRecord],
        variables: &mut VariableMap,
    ) -> Result<()> {
        let index: HashMap<String, usize> =
            records.iter().enumerate().map(|(i, r)| (r.name().to_string(), i)).collect();
        let mut graph: DependencyGraph<String> = DependencyGraph::new();

        for record in records.iter_mut() {
            let Some(condition) = record.precedence().is_enabled_condition() else {
                continue;
            };
            let outcome = self.evaluate_one(record.name(), condition, variables)?;
            record.set_is_enabled_result(outcome.result);

            for referenced in &outcome.referenced {
                if referenced != record.name() && index.contains_key(referenced) {
                    tracing::trace!(
                        "Parameter '{}' enablement depends on '{}'",
                        record.name(),
                        referenced
                    );
                    graph.add_edge(record.name().to_string(), referenced.clone());
                }
            }
        }

        let seeds: Vec<String> = records
            .iter()
            .filter(|r| r.is_enabled_result() == Some(false))
            .map(|r| r.name().to_string())
            .collect();
        for seed in &seeds {
            variables.remove(seed);
        }

        if graph.edge_count() == 0 {
            tracing::debug!("No dependencies between enablement conditions; skipping cascade");
            return Ok(());
        }

        let affected = graph.subgraph_dependent_on(&seeds, false);

        let order = match affected.try_topological_sort() {
            Ok(order) => order,
            Err(err) => {
                let cycle = affected.detect_cycle().unwrap_or(err.unordered);
                return Err(ResolverError::CircularParameterDependency {
                    cycle,
                });
            }
        };

        if let Some(cycle) = graph.detect_cycle() {
            tracing::warn!(
                "Parameter conditions contain a cycle ({}) that the current values allow to resolve",
                cycle.join(" -> ")
            );
        }

        if !order.is_empty() {
            tracing::debug!("Re-evaluating enablement after disablement cascade: {}", order.join(", "));
        }

        for name in order {
            let Some(&i) = index.get(&name) else {
                continue;
            };
            let record = &mut records[i];
            let Some(condition) = record.precedence().is_enabled_condition() else {
                continue;
            };
            let outcome = self.evaluate_one(record.name(), condition, variables)?;
            record.set_is_enabled_result(outcome.result);

            if outcome.result {
                // A seed that depends on another seed can come back enabled.
                if let Some(value) = record.value() {
                    variables.insert(record.name(), value.clone());
                }
            } else {
                variables.remove(record.name());
            }
        }

        Ok(())
    }

    fn evaluate_requirement(
        &self,
        records: &mut [EvaluationRecord],
        variables: &VariableMap,
    ) -> Result<()> {
        for record in records.iter_mut() {
            let Some(condition) = record.precedence().is_required_condition() else {
                continue;
            };
            let outcome = self.evaluate_one(record.name(), condition, variables)?;
            record.set_is_required_result(outcome.result);
        }
        Ok(())
    }

    fn evaluate_one(
        &self,
        parameter: &str,
        condition: &str,
        variables: &VariableMap,
    ) -> Result<ConditionOutcome> {
        self.adapter.evaluate_condition(condition, variables).map_err(|e| {
            ResolverError::MalformedCondition {
                parameter: parameter.to_string(),
                condition: condition.to_string(),
                reason: e.message,
            }
        })
    }

    /// Check caller-supplied condition results against a fresh evaluation.
    ///
    /// The records are left untouched. In strict mode any mismatch is an
    /// error; in lenient mode mismatches are logged, the supplied results are
    /// trusted, and the mismatches are returned for the caller to inspect.
    ///
    /// # Errors
    ///
    /// - [`ResolverError::ConditionResultPresence`] when supplied results do
    ///   not mirror the conditions
    /// - [`ResolverError::ConditionResultsMismatch`] in strict mode
    /// - any error [`evaluate`](Self::evaluate) can return
    pub fn verify_supplied_results(
        &self,
        records: &[EvaluationRecord],
        mode: ConditionCheckMode,
    ) -> Result<Vec<ConditionMismatch>> {
        for record in records {
            record.check_condition_presence()?;
        }

        let mut recomputed = records.to_vec();
        self.evaluate(&mut recomputed)?;

        let mut mismatches = Vec::new();
        for (supplied, computed) in records.iter().zip(&recomputed) {
            if supplied.is_enabled_result() != computed.is_enabled_result() {
                mismatches.push(ConditionMismatch {
                    parameter: supplied.name().to_string(),
                    condition: "isEnabled",
                    supplied: supplied.is_enabled_result(),
                    computed: computed.is_enabled_result(),
                });
            }
            if supplied.is_required_result() != computed.is_required_result() {
                mismatches.push(ConditionMismatch {
                    parameter: supplied.name().to_string(),
                    condition: "isRequired",
                    supplied: supplied.is_required_result(),
                    computed: computed.is_required_result(),
                });
            }
        }

        if mismatches.is_empty() {
            return Ok(mismatches);
        }
        match mode {
            ConditionCheckMode::Strict => Err(ResolverError::ConditionResultsMismatch {
                mismatches,
            }),
            ConditionCheckMode::Lenient => {
                for mismatch in &mismatches {
                    tracing::warn!(
                        "Supplied condition result disagrees with template conditions, keeping supplied value: {}",
                        mismatch
                    );
                }
                Ok(mismatches)
            }
        }
    }

    /// Evaluate conditions unless the caller already supplied results, in
    /// which case verify them in the given mode.
    ///
    /// Returns the variable snapshot of enabled parameters.
    ///
    /// # Errors
    ///
    /// See [`evaluate`](Self::evaluate) and
    /// [`verify_supplied_results`](Self::verify_supplied_results).
    pub fn evaluate_or_verify(
        &self,
        records: &mut [EvaluationRecord],
        mode: ConditionCheckMode,
    ) -> Result<VariableMap> {
        if records.iter().any(EvaluationRecord::has_condition_results) {
            self.verify_supplied_results(records, mode)?;
            return Ok(enabled_variables(records));
        }
        self.evaluate(records)
    }
}

/// Values of every parameter that has one.
fn initial_variables(records: &[EvaluationRecord]) -> VariableMap {
    records
        .iter()
        .filter_map(|r| r.value().map(|v| (r.name().to_string(), v.clone())))
        .collect()
}

/// Values of every parameter that has one and is not disabled by its results.
fn enabled_variables(records: &[EvaluationRecord]) -> VariableMap {
    records
        .iter()
        .filter(|r| r.is_enabled_result() != Some(false))
        .filter_map(|r| r.value().map(|v| (r.name().to_string(), v.clone())))
        .collect()
}
