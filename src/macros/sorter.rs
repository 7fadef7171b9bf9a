//! Dependency ordering of generated symbols.

use std::collections::BTreeSet;

use super::GeneratedSymbol;
use crate::core::{ResolverError, Result};
use crate::expression::{ConditionAdapter, ExpressionEvaluator, VariableMap};
use crate::resolver::dependency_graph::DependencyGraph;

/// Order symbols so every symbol follows the symbols it reads.
///
/// References are resolved against the universe of known names: every symbol
/// plus every name in `parameter_names`. Conditions are traced with each known
/// name bound to its own name as a string. References to unknown names are
/// dropped. Symbols with no ordering constraint between them keep their
/// declared order. Each returned symbol carries its resolved dependencies.
///
/// # Errors
///
/// Returns [`ResolverError::SymbolCircle`] naming the symbols on a cycle.
pub fn sort_generated_symbols<S: AsRef<str>>(
    symbols: Vec<GeneratedSymbol>,
    parameter_names: &[S],
    evaluator: &dyn ExpressionEvaluator,
) -> Result<Vec<GeneratedSymbol>> {
    let adapter = ConditionAdapter::new(evaluator);

    let mut known: BTreeSet<String> = symbols.iter().map(|s| s.name.clone()).collect();
    known.extend(parameter_names.iter().map(|p| p.as_ref().to_string()));
    let universe: VariableMap =
        known.iter().map(|name| (name.clone(), serde_json::Value::String(name.clone()))).collect();

    let mut graph: DependencyGraph<String> = DependencyGraph::new();
    let mut symbols = symbols;
    for symbol in &mut symbols {
        graph.add_vertex(symbol.name.clone());
        let mut dependencies = symbol.referenced_names(&adapter, &universe);
        dependencies.retain(|name| known.contains(name));
        for dependency in &dependencies {
            graph.add_edge(symbol.name.clone(), dependency.clone());
        }
        symbol.dependencies = dependencies;
    }

    let order = match graph.try_topological_sort() {
        Ok(order) => order,
        Err(err) => {
            let mut names = graph.detect_cycle().unwrap_or(err.unordered);
            if names.len() > 1 && names.first() == names.last() {
                names.pop();
            }
            return Err(ResolverError::SymbolCircle {
                names,
            });
        }
    };

    let mut sorted = Vec::with_capacity(symbols.len());
    for name in order {
        if let Some(pos) = symbols.iter().position(|s| s.name == name) {
            sorted.push(symbols.swap_remove(pos));
        }
    }
    tracing::debug!(
        "Generated symbol evaluation order: {}",
        sorted.iter().map(|s| s.name.as_str()).collect::<Vec<_>>().join(", ")
    );
    Ok(sorted)
}
