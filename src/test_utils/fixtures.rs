//! Builders for evaluation records and generated symbols used in tests.

use serde_json::Value;

use crate::macros::{GeneratedSymbol, MacroKind};
use crate::parameters::{DataSource, EvaluationRecord, ParameterDefinition, PrecedenceRule};

/// Record for a string parameter holding a user-supplied value.
pub fn record(name: &str, rule: PrecedenceRule, value: Value) -> EvaluationRecord {
    EvaluationRecord::with_value(ParameterDefinition::new(name, rule), value, DataSource::User)
}

/// Record for a string parameter with no value.
pub fn record_without_value(name: &str, rule: PrecedenceRule) -> EvaluationRecord {
    EvaluationRecord::new(ParameterDefinition::new(name, rule))
}

/// Optional parameter that is disabled unless `condition` holds.
pub fn disabled_when_not(name: &str, condition: &str, value: Value) -> EvaluationRecord {
    record(name, PrecedenceRule::conditionally_disabled(condition), value)
}

/// Generated symbol without a data type.
pub fn symbol(name: &str, kind: MacroKind) -> GeneratedSymbol {
    GeneratedSymbol::new(name, kind)
}
