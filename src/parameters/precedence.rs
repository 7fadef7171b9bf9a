//! Mapping of precedence rules and condition results to final precedence.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{EvaluationRecord, PrecedenceDefinition};
use crate::core::{ResolverError, Result};

/// Condition-resolved requiredness of a parameter for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EvaluatedPrecedence {
    Required,
    Optional,
    Implicit,
    Disabled,
}

impl EvaluatedPrecedence {
    pub const fn is_enabled(self) -> bool {
        !matches!(self, EvaluatedPrecedence::Disabled)
    }
}

impl fmt::Display for EvaluatedPrecedence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EvaluatedPrecedence::Required => "required",
            EvaluatedPrecedence::Optional => "optional",
            EvaluatedPrecedence::Implicit => "implicit",
            EvaluatedPrecedence::Disabled => "disabled",
        };
        f.write_str(label)
    }
}

/// Compute the final precedence of a parameter.
///
/// | Rule | Condition results | Result |
/// |---|---|---|
/// | Required | | Required |
/// | ConditionallyRequired | required | Required |
/// | ConditionallyRequired | not required | Optional |
/// | Optional | | Optional |
/// | Implicit | | Implicit |
/// | ConditionallyDisabled | not enabled | Disabled |
/// | ConditionallyDisabled | enabled, required (result or flag) | Required |
/// | ConditionallyDisabled | enabled otherwise | Optional |
/// | Disabled | | Disabled |
///
/// # Errors
///
/// Returns [`ResolverError::UnmappedPrecedence`] when a conditional rule is
/// missing the condition result it needs; that only happens when conditions
/// have not been evaluated yet.
pub fn evaluate_precedence(record: &EvaluationRecord) -> Result<EvaluatedPrecedence> {
    let rule = record.precedence();
    let missing = |condition: &str| ResolverError::UnmappedPrecedence {
        parameter: record.name().to_string(),
        reason: format!("{condition} condition has not been evaluated"),
    };

    let precedence = match rule.definition() {
        PrecedenceDefinition::Required => EvaluatedPrecedence::Required,
        PrecedenceDefinition::ConditionallyRequired => {
            if record.is_required_result().ok_or_else(|| missing("isRequired"))? {
                EvaluatedPrecedence::Required
            } else {
                EvaluatedPrecedence::Optional
            }
        }
        PrecedenceDefinition::Optional => EvaluatedPrecedence::Optional,
        PrecedenceDefinition::Implicit => EvaluatedPrecedence::Implicit,
        PrecedenceDefinition::ConditionallyDisabled => {
            if !record.is_enabled_result().ok_or_else(|| missing("isEnabled"))? {
                EvaluatedPrecedence::Disabled
            } else if record.is_required_result() == Some(true) || rule.is_required() {
                EvaluatedPrecedence::Required
            } else {
                EvaluatedPrecedence::Optional
            }
        }
        PrecedenceDefinition::Disabled => EvaluatedPrecedence::Disabled,
    };
    Ok(precedence)
}
