//! Caller-supplied condition results checked against the template conditions

use anyhow::Result;
use serde_json::json;

use crate::common::{lenient, resolver, resolver_with};
use scaffold_resolver::ResolverError;
use scaffold_resolver::core::ErrorClass;
use scaffold_resolver::parameters::{EvaluatedPrecedence, ParameterDefinition, PrecedenceRule};
use scaffold_resolver::resolver::{ParameterInput, ParameterInputs};

fn definitions() -> Vec<ParameterDefinition> {
    vec![
        ParameterDefinition::new("A", PrecedenceRule::optional()),
        ParameterDefinition::new("B", PrecedenceRule::conditionally_disabled("A == 'x'")),
    ]
}

/// B claims to be enabled although A does not satisfy its condition.
fn disagreeing_inputs() -> ParameterInputs {
    let mut inputs = ParameterInputs::new();
    inputs.insert("A".into(), ParameterInput::user(json!("y")));
    inputs.insert(
        "B".into(),
        ParameterInput::user(json!("b")).with_condition_results(Some(true), None),
    );
    inputs
}

#[test]
fn test_strict_mode_rejects_mismatch() {
    let err = resolver().resolve(&definitions(), &disagreeing_inputs(), vec![]).unwrap_err();

    assert_eq!(err.class(), ErrorClass::TemplateAuthoring);
    let ResolverError::ConditionResultsMismatch {
        mismatches,
    } = &err
    else {
        panic!("expected a mismatch error, got {err:?}");
    };
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].parameter, "B");
    assert_eq!(mismatches[0].supplied, Some(true));
    assert_eq!(mismatches[0].computed, Some(false));
    assert!(err.to_string().contains("B.isEnabled"));
}

#[test]
fn test_lenient_mode_keeps_supplied_result() -> Result<()> {
    scaffold_resolver::test_utils::init_test_logging(None);

    let resolved = resolver_with(lenient()).resolve(&definitions(), &disagreeing_inputs(), vec![])?;

    let b = resolved.parameter("B").unwrap();
    assert_eq!(b.evaluated_precedence, EvaluatedPrecedence::Optional);
    assert_eq!(resolved.value("B"), Some(&json!("b")));
    Ok(())
}

#[test]
fn test_agreeing_results_pass_in_strict_mode() -> Result<()> {
    let mut inputs = ParameterInputs::new();
    inputs.insert("A".into(), ParameterInput::user(json!("x")));
    inputs.insert(
        "B".into(),
        ParameterInput::user(json!("b")).with_condition_results(Some(true), None),
    );
    let resolved = resolver().resolve(&definitions(), &inputs, vec![])?;
    assert!(resolved.disabled_parameters().is_empty());
    Ok(())
}

#[test]
fn test_results_without_conditions_are_rejected() {
    let mut inputs = ParameterInputs::new();
    inputs.insert(
        "A".into(),
        ParameterInput::user(json!("x")).with_condition_results(None, Some(true)),
    );
    let err = resolver().resolve(&definitions(), &inputs, vec![]).unwrap_err();
    assert!(matches!(err, ResolverError::ConditionResultPresence { .. }));
    assert_eq!(err.class(), ErrorClass::Internal);
}
