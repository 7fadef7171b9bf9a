//! Precedence rule validation and the final-precedence table.

use serde_json::json;

use scaffold_resolver::ResolverError;
use scaffold_resolver::parameters::{
    EvaluatedPrecedence, EvaluationRecord, ParameterConditionEvaluator, ParameterDefinition,
    PrecedenceDefinition, PrecedenceRule, evaluate_precedence,
};
use scaffold_resolver::test_utils::{
    SimpleConditionEvaluator, disabled_when_not, record, record_without_value,
};

const UNCONDITIONAL: [(PrecedenceDefinition, EvaluatedPrecedence); 4] = [
    (PrecedenceDefinition::Required, EvaluatedPrecedence::Required),
    (PrecedenceDefinition::Optional, EvaluatedPrecedence::Optional),
    (PrecedenceDefinition::Implicit, EvaluatedPrecedence::Implicit),
    (PrecedenceDefinition::Disabled, EvaluatedPrecedence::Disabled),
];

#[test]
fn unconditional_rules_depend_on_the_rule_alone() {
    let evaluator = SimpleConditionEvaluator;
    for (definition, expected) in UNCONDITIONAL {
        let rule = PrecedenceRule::unconditional("p", definition).unwrap();
        for neighbour in [json!("x"), json!(true), json!(false), json!(null)] {
            let mut records = vec![
                record("p", rule.clone(), json!("value")),
                record("other", PrecedenceRule::optional(), neighbour),
                disabled_when_not("gated", "other == 'x'", json!("g")),
            ];
            ParameterConditionEvaluator::new(&evaluator).evaluate(&mut records).unwrap();
            assert_eq!(evaluate_precedence(&records[0]).unwrap(), expected, "{definition:?}");
        }
    }
}

#[test]
fn conditional_definitions_need_their_conditions() {
    let err = PrecedenceRule::unconditional("p", PrecedenceDefinition::ConditionallyRequired).unwrap_err();
    assert!(matches!(err, ResolverError::InvalidPrecedence { .. }));

    let err = PrecedenceRule::unconditional("p", PrecedenceDefinition::ConditionallyDisabled).unwrap_err();
    assert!(matches!(err, ResolverError::InvalidPrecedence { .. }));

    let err =
        PrecedenceRule::new("p", PrecedenceDefinition::Optional, None, Some("A".into()), false).unwrap_err();
    assert!(err.to_string().contains("'p'"));

    let err =
        PrecedenceRule::new("p", PrecedenceDefinition::Required, Some("A".into()), None, false).unwrap_err();
    assert!(matches!(err, ResolverError::InvalidPrecedence { .. }));

    // Blank conditions count as absent.
    let rule = PrecedenceRule::new("p", PrecedenceDefinition::Optional, Some("  ".into()), None, false).unwrap();
    assert!(!rule.has_conditions());
}

#[test]
fn conditional_table() {
    let cases = [
        (PrecedenceRule::conditionally_required("A"), None, Some(true), EvaluatedPrecedence::Required),
        (PrecedenceRule::conditionally_required("A"), None, Some(false), EvaluatedPrecedence::Optional),
        (PrecedenceRule::conditionally_disabled("A"), Some(false), None, EvaluatedPrecedence::Disabled),
        (PrecedenceRule::conditionally_disabled("A"), Some(true), None, EvaluatedPrecedence::Optional),
        (
            PrecedenceRule::conditionally_disabled("A").with_required_flag(true),
            Some(true),
            None,
            EvaluatedPrecedence::Required,
        ),
        (
            PrecedenceRule::conditionally_disabled("A").with_required_flag(true),
            Some(false),
            None,
            EvaluatedPrecedence::Disabled,
        ),
    ];
    for (rule, enabled, required, expected) in cases {
        let record = EvaluationRecord::new(ParameterDefinition::new("p", rule))
            .with_condition_results(enabled, required)
            .unwrap();
        assert_eq!(evaluate_precedence(&record).unwrap(), expected);
    }
}

#[test]
fn full_evaluation_is_idempotent() {
    let evaluator = SimpleConditionEvaluator;
    let conditions = ParameterConditionEvaluator::new(&evaluator);
    let mut records = vec![
        record("Root", PrecedenceRule::optional(), json!("off")),
        disabled_when_not("A", "Root == 'on'", json!(true)),
        disabled_when_not("B", "A", json!(true)),
        record("C", PrecedenceRule::conditionally_required("B || Root == 'off'"), json!("c")),
    ];

    conditions.evaluate(&mut records).unwrap();
    let first: Vec<_> = records.iter().map(|r| evaluate_precedence(r).unwrap()).collect();
    let snapshot = records.clone();

    conditions.evaluate(&mut records).unwrap();
    let second: Vec<_> = records.iter().map(|r| evaluate_precedence(r).unwrap()).collect();

    assert_eq!(snapshot, records);
    assert_eq!(first, second);
    assert_eq!(
        first,
        vec![
            EvaluatedPrecedence::Optional,
            EvaluatedPrecedence::Disabled,
            EvaluatedPrecedence::Disabled,
            EvaluatedPrecedence::Required,
        ]
    );
}

#[test]
fn parameters_without_values_read_as_null() {
    let evaluator = SimpleConditionEvaluator;
    let mut records = vec![
        record_without_value("Source", PrecedenceRule::optional()),
        disabled_when_not("Gated", "Source == null", json!("g")),
        disabled_when_not("Other", "Source", json!("o")),
    ];
    let variables = ParameterConditionEvaluator::new(&evaluator).evaluate(&mut records).unwrap();

    assert_eq!(evaluate_precedence(&records[1]).unwrap(), EvaluatedPrecedence::Optional);
    assert_eq!(evaluate_precedence(&records[2]).unwrap(), EvaluatedPrecedence::Disabled);
    assert!(!variables.contains("Source"));
    assert!(variables.contains("Gated"));
}
